//! The offset-addressed storage engine: a file header plus two intrusive
//! singly-linked lists (vertices, edges), ported from `storage.c`. Every
//! operation returns a typed `StorageResult` instead of `storage.c`'s
//! boolean-plus-`errno` convention.

pub mod codec;
mod error;

pub use error::{StorageError, StorageResult};

use std::fs::File;
use std::sync::Arc;

use codec::{EdgeRecord, ListNode, RawList, VertexRecord};

/// A handle to an open storage file. Cheap to clone: it shares the
/// underlying `File` via `Arc`.
#[derive(Clone)]
pub struct Storage {
    file: Arc<File>,
}

impl Storage {
    /// Initializes a brand-new storage file: writes the signature and two
    /// empty lists. Callers open-or-init based on whether the signature is
    /// already present.
    pub fn init(file: File) -> StorageResult<Storage> {
        codec::write_header(&file, codec::Header::default())?;
        Ok(Storage {
            file: Arc::new(file),
        })
    }

    /// Opens an existing storage file, checking the signature.
    pub fn open(file: File) -> StorageResult<Storage> {
        let signature = codec::read_signature(&file)?;
        if &signature != codec::SIGNATURE {
            return Err(StorageError::InvalidFormat);
        }
        Ok(Storage {
            file: Arc::new(file),
        })
    }

    fn same_file(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.file, &other.file)
    }

    /// The first vertex in file order, or a handle with `offset() == 0` if
    /// there are none.
    pub fn first_vertex(&self) -> StorageResult<VertexHandle> {
        let header = codec::read_header(&self.file)?;
        Ok(VertexHandle {
            storage: self.clone(),
            offset: header.vertices.head,
        })
    }

    /// The first edge in file order, or a handle with `offset() == 0` if
    /// there are none.
    pub fn first_edge(&self) -> StorageResult<EdgeHandle> {
        let header = codec::read_header(&self.file)?;
        Ok(EdgeHandle {
            storage: self.clone(),
            offset: header.edges.head,
        })
    }

    pub fn create_vertex(&self) -> StorageResult<VertexHandle> {
        let record_offset = codec::append_vertex_record(&self.file)?;
        let node_offset = self.add_to_list(codec::HEADER_VERTICES_LIST_OFFSET, record_offset)?;
        Ok(VertexHandle {
            storage: self.clone(),
            offset: node_offset,
        })
    }

    pub fn create_edge(&self) -> StorageResult<EdgeHandle> {
        let record_offset = codec::append_edge_record(&self.file)?;
        let node_offset = self.add_to_list(codec::HEADER_EDGES_LIST_OFFSET, record_offset)?;
        Ok(EdgeHandle {
            storage: self.clone(),
            offset: node_offset,
        })
    }

    /// Appends a new list node pointing at `value` onto the list anchored at
    /// `list_offset`, returning the new node's own offset (a "handle").
    /// Ports `add_element_to_list`.
    fn add_to_list(&self, list_offset: u64, value: u64) -> StorageResult<u64> {
        let list = codec::read_list_at(&self.file, list_offset)?;
        let new_node_offset = codec::append_node(&self.file, ListNode { next: 0, value })?;

        if list.tail != 0 {
            let mut tail_node = codec::read_node_at(&self.file, list.tail)?;
            tail_node.next = new_node_offset;
            codec::write_node_at(&self.file, list.tail, tail_node)?;
        }

        let new_list = RawList {
            head: if list.head == 0 {
                new_node_offset
            } else {
                list.head
            },
            tail: new_node_offset,
        };
        codec::write_list_at(&self.file, list_offset, new_list)?;

        Ok(new_node_offset)
    }

    /// Unlinks `node_offset` from the list anchored at `list_offset` without
    /// reclaiming its bytes. Ports `remove_node_from_list`.
    fn remove_from_list(&self, list_offset: u64, node_offset: u64) -> StorageResult<()> {
        let mut list = codec::read_list_at(&self.file, list_offset)?;

        if list.head == 0 && list.tail == 0 {
            return Ok(());
        }

        if list.head == node_offset {
            if list.tail == node_offset {
                list.head = 0;
                list.tail = 0;
            } else {
                let current = codec::read_node_at(&self.file, node_offset)?;
                list.head = current.next;
            }
            codec::write_list_at(&self.file, list_offset, list)?;
            return Ok(());
        }

        let mut prev_offset = list.head;
        while prev_offset != 0 {
            let mut prev_node = codec::read_node_at(&self.file, prev_offset)?;

            if prev_node.next == node_offset {
                let current = codec::read_node_at(&self.file, node_offset)?;
                prev_node.next = current.next;
                codec::write_node_at(&self.file, prev_offset, prev_node)?;

                if list.tail == node_offset {
                    list.tail = prev_offset;
                    codec::write_list_at(&self.file, list_offset, list)?;
                }
                return Ok(());
            }

            prev_offset = prev_node.next;
        }

        Ok(())
    }

    fn vertex_record(&self, handle: &VertexHandle) -> StorageResult<VertexRecord> {
        let node = codec::read_node_at(&self.file, handle.offset)?;
        Ok(codec::read_vertex_record_at(&self.file, node.value)?)
    }

    fn edge_record(&self, handle: &EdgeHandle) -> StorageResult<EdgeRecord> {
        let node = codec::read_node_at(&self.file, handle.offset)?;
        Ok(codec::read_edge_record_at(&self.file, node.value)?)
    }

    fn vertex_record_offset(&self, handle: &VertexHandle) -> StorageResult<u64> {
        Ok(codec::read_node_at(&self.file, handle.offset)?.value)
    }

    fn edge_record_offset(&self, handle: &EdgeHandle) -> StorageResult<u64> {
        Ok(codec::read_node_at(&self.file, handle.offset)?.value)
    }

    pub fn vertex_next(&self, handle: &VertexHandle) -> StorageResult<VertexHandle> {
        let node = codec::read_node_at(&self.file, handle.offset)?;
        Ok(VertexHandle {
            storage: self.clone(),
            offset: node.next,
        })
    }

    pub fn edge_next(&self, handle: &EdgeHandle) -> StorageResult<EdgeHandle> {
        let node = codec::read_node_at(&self.file, handle.offset)?;
        Ok(EdgeHandle {
            storage: self.clone(),
            offset: node.next,
        })
    }

    pub fn vertex_has_label(&self, handle: &VertexHandle, label: &str) -> StorageResult<bool> {
        let record = self.vertex_record(handle)?;
        let mut offset = record.labels.head;
        while offset != 0 {
            let node = codec::read_node_at(&self.file, offset)?;
            let name = codec::read_string_at(&self.file, node.value)?;
            if name == label {
                return Ok(true);
            }
            offset = node.next;
        }
        Ok(false)
    }

    /// Adds `label`, unless the vertex already carries it. Idempotent:
    /// repeated adds of the same label never grow the labels list. Ports
    /// `storage_vertex_add_label`'s `EINVAL` rejection of a null label as
    /// `InvalidArg` on an empty one.
    pub fn vertex_add_label(&self, handle: &VertexHandle, label: &str) -> StorageResult<()> {
        if label.is_empty() {
            return Err(StorageError::InvalidArg("label must not be empty".into()));
        }
        if self.vertex_has_label(handle, label)? {
            return Ok(());
        }

        let record_offset = self.vertex_record_offset(handle)?;
        let labels_list_offset = record_offset + codec::VERTEX_LABELS_LIST_OFFSET;
        let string_offset = codec::append_string(&self.file, label)?;
        self.add_to_list(labels_list_offset, string_offset)?;
        Ok(())
    }

    /// Unlinks the first label node matching `label`, if any. Matches the
    /// original: removing a label that isn't present is not an error.
    pub fn vertex_remove_label(&self, handle: &VertexHandle, label: &str) -> StorageResult<()> {
        let record_offset = self.vertex_record_offset(handle)?;
        let labels_list_offset = record_offset + codec::VERTEX_LABELS_LIST_OFFSET;
        let record = self.vertex_record(handle)?;

        let mut offset = record.labels.head;
        while offset != 0 {
            let node = codec::read_node_at(&self.file, offset)?;
            let name = codec::read_string_at(&self.file, node.value)?;
            if name == label {
                self.remove_from_list(labels_list_offset, offset)?;
                return Ok(());
            }
            offset = node.next;
        }
        Ok(())
    }

    pub fn vertex_first_label(&self, handle: &VertexHandle) -> StorageResult<LabelHandle> {
        let record = self.vertex_record(handle)?;
        Ok(LabelHandle {
            storage: self.clone(),
            offset: record.labels.head,
        })
    }

    pub fn vertex_labels_amount(&self, handle: &VertexHandle) -> StorageResult<u64> {
        let record = self.vertex_record(handle)?;
        let mut count = 0;
        let mut offset = record.labels.head;
        while offset != 0 {
            count += 1;
            offset = codec::read_node_at(&self.file, offset)?.next;
        }
        Ok(count)
    }

    pub fn vertex_get_attribute(
        &self,
        handle: &VertexHandle,
        name: &str,
    ) -> StorageResult<Option<String>> {
        let record = self.vertex_record(handle)?;
        let mut offset = record.attributes.head;
        while offset != 0 {
            let node = codec::read_node_at(&self.file, offset)?;
            let (attr_name, _, value_ptr) = codec::read_attribute_at(&self.file, node.value)?;
            if attr_name == name {
                if value_ptr == 0 {
                    return Ok(None);
                }
                return Ok(Some(codec::read_string_at(&self.file, value_ptr)?));
            }
            offset = node.next;
        }
        Ok(None)
    }

    /// Sets an attribute's value, creating the attribute node on first use
    /// and updating the stored value pointer on subsequent calls. Ports
    /// `storage_vertex_set_attribute`'s `EINVAL` rejection of a null name as
    /// `InvalidArg` on an empty one.
    pub fn vertex_set_attribute(
        &self,
        handle: &VertexHandle,
        name: &str,
        value: &str,
    ) -> StorageResult<()> {
        if name.is_empty() {
            return Err(StorageError::InvalidArg(
                "attribute name must not be empty".into(),
            ));
        }
        let record = self.vertex_record(handle)?;
        let value_offset = codec::append_string(&self.file, value)?;

        let mut offset = record.attributes.head;
        while offset != 0 {
            let node = codec::read_node_at(&self.file, offset)?;
            let (attr_name, value_ptr_offset, _) =
                codec::read_attribute_at(&self.file, node.value)?;
            if attr_name == name {
                codec::write_u64_at(&self.file, value_ptr_offset, value_offset)?;
                return Ok(());
            }
            offset = node.next;
        }

        let record_offset = self.vertex_record_offset(handle)?;
        let attributes_list_offset = record_offset + codec::VERTEX_ATTRIBUTES_LIST_OFFSET;
        let attr_offset = codec::append_attribute(&self.file, name, value_offset)?;
        self.add_to_list(attributes_list_offset, attr_offset)?;
        Ok(())
    }

    /// Tombstones an attribute's value: the attribute node stays linked with
    /// its value pointer zeroed, matching `storage_vertex_set_attribute(v, n,
    /// NULL)`'s behavior in `storage.c`. Removing an attribute that was
    /// never set is not an error.
    pub fn vertex_remove_attribute(&self, handle: &VertexHandle, name: &str) -> StorageResult<()> {
        if name.is_empty() {
            return Err(StorageError::InvalidArg(
                "attribute name must not be empty".into(),
            ));
        }
        let record = self.vertex_record(handle)?;
        let mut offset = record.attributes.head;
        while offset != 0 {
            let node = codec::read_node_at(&self.file, offset)?;
            let (attr_name, value_ptr_offset, _) =
                codec::read_attribute_at(&self.file, node.value)?;
            if attr_name == name {
                codec::write_u64_at(&self.file, value_ptr_offset, 0)?;
                return Ok(());
            }
            offset = node.next;
        }
        Ok(())
    }

    pub fn vertex_first_attribute(&self, handle: &VertexHandle) -> StorageResult<AttributeHandle> {
        let record = self.vertex_record(handle)?;
        Ok(AttributeHandle {
            storage: self.clone(),
            offset: record.attributes.head,
        })
    }

    pub fn vertex_attributes_amount(&self, handle: &VertexHandle) -> StorageResult<u64> {
        let record = self.vertex_record(handle)?;
        let mut count = 0;
        let mut offset = record.attributes.head;
        while offset != 0 {
            count += 1;
            offset = codec::read_node_at(&self.file, offset)?.next;
        }
        Ok(count)
    }

    /// Unlinks the vertex from the vertex list. The vertex and attribute/
    /// label records it owns are left in the file -- the format never
    /// reclaims space.
    pub fn vertex_drop(&self, handle: &VertexHandle) -> StorageResult<()> {
        self.remove_from_list(codec::HEADER_VERTICES_LIST_OFFSET, handle.offset)
    }

    pub fn edge_get_source(&self, handle: &EdgeHandle) -> StorageResult<VertexHandle> {
        let record = self.edge_record(handle)?;
        Ok(VertexHandle {
            storage: self.clone(),
            offset: record.source,
        })
    }

    pub fn edge_set_source(&self, handle: &EdgeHandle, vertex: &VertexHandle) -> StorageResult<()> {
        let edge_record_offset = self.edge_record_offset(handle)?;
        codec::write_u64_at(&self.file, edge_record_offset + 8, vertex.offset)?;
        Ok(())
    }

    pub fn edge_get_destination(&self, handle: &EdgeHandle) -> StorageResult<VertexHandle> {
        let record = self.edge_record(handle)?;
        Ok(VertexHandle {
            storage: self.clone(),
            offset: record.destination,
        })
    }

    pub fn edge_set_destination(
        &self,
        handle: &EdgeHandle,
        vertex: &VertexHandle,
    ) -> StorageResult<()> {
        let edge_record_offset = self.edge_record_offset(handle)?;
        codec::write_u64_at(&self.file, edge_record_offset + 16, vertex.offset)?;
        Ok(())
    }

    pub fn edge_get_label(&self, handle: &EdgeHandle) -> StorageResult<Option<String>> {
        let record = self.edge_record(handle)?;
        if record.label == 0 {
            return Ok(None);
        }
        Ok(Some(codec::read_string_at(&self.file, record.label)?))
    }

    pub fn edge_set_label(&self, handle: &EdgeHandle, label: &str) -> StorageResult<()> {
        let edge_record_offset = self.edge_record_offset(handle)?;
        let string_offset = codec::append_string(&self.file, label)?;
        codec::write_u64_at(&self.file, edge_record_offset, string_offset)?;
        Ok(())
    }

    /// Clears the edge's label, but only if it currently equals `label`.
    /// Ports `storage_edge_remove_label`: removing a label that isn't the
    /// one currently set is not an error, and leaves the edge untouched.
    pub fn edge_remove_label(&self, handle: &EdgeHandle, label: &str) -> StorageResult<()> {
        if self.edge_get_label(handle)?.as_deref() != Some(label) {
            return Ok(());
        }
        let edge_record_offset = self.edge_record_offset(handle)?;
        codec::write_u64_at(&self.file, edge_record_offset, 0)?;
        Ok(())
    }

    /// Unlinks the edge from the edge list. Like `vertex_drop`, the edge's
    /// own record stays in the file.
    pub fn edge_drop(&self, handle: &EdgeHandle) -> StorageResult<()> {
        self.remove_from_list(codec::HEADER_EDGES_LIST_OFFSET, handle.offset)
    }

    pub fn label_next(&self, handle: &LabelHandle) -> StorageResult<LabelHandle> {
        let node = codec::read_node_at(&self.file, handle.offset)?;
        Ok(LabelHandle {
            storage: self.clone(),
            offset: node.next,
        })
    }

    pub fn label_get(&self, handle: &LabelHandle) -> StorageResult<String> {
        let node = codec::read_node_at(&self.file, handle.offset)?;
        Ok(codec::read_string_at(&self.file, node.value)?)
    }

    pub fn attribute_next(&self, handle: &AttributeHandle) -> StorageResult<AttributeHandle> {
        let node = codec::read_node_at(&self.file, handle.offset)?;
        Ok(AttributeHandle {
            storage: self.clone(),
            offset: node.next,
        })
    }

    pub fn attribute_get(
        &self,
        handle: &AttributeHandle,
    ) -> StorageResult<(String, Option<String>)> {
        let node = codec::read_node_at(&self.file, handle.offset)?;
        let (name, _, value_ptr) = codec::read_attribute_at(&self.file, node.value)?;
        let value = if value_ptr == 0 {
            None
        } else {
            Some(codec::read_string_at(&self.file, value_ptr)?)
        };
        Ok((name, value))
    }
}

macro_rules! offset_handle {
    ($name:ident) => {
        #[derive(Clone)]
        pub struct $name {
            storage: Storage,
            offset: u64,
        }

        impl $name {
            /// The offset of the list node this handle points at. `0` means
            /// "past the end" (no such node).
            pub fn offset(&self) -> u64 {
                self.offset
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.storage.same_file(&other.storage) && self.offset == other.offset
            }
        }

        impl Eq for $name {}

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("offset", &self.offset)
                    .finish()
            }
        }
    };
}

offset_handle!(VertexHandle);
offset_handle!(EdgeHandle);
offset_handle!(LabelHandle);
offset_handle!(AttributeHandle);

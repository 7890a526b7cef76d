//! Fixed-layout binary encode/decode for the on-disk shapes: the file header,
//! intrusive list headers, list nodes, length-prefixed strings, and the
//! vertex/edge/attribute records. Everything is little-endian with no
//! padding, mirroring `storage_struct_.c`'s `read_full_value`/`write_full_value`
//! helpers byte-for-byte.

use std::fs::File;
use std::io::{self, ErrorKind};
use std::os::unix::fs::FileExt;

use bytes::{BufMut, BytesMut};

pub const SIGNATURE: &[u8; 4] = b"DOTA";

pub const LIST_SIZE: u64 = 16;
pub const NODE_SIZE: u64 = 16;
pub const HEADER_SIZE: u64 = 4 + LIST_SIZE + LIST_SIZE;
pub const VERTEX_RECORD_SIZE: u64 = LIST_SIZE + LIST_SIZE;
pub const EDGE_RECORD_SIZE: u64 = 8 + 8 + 8;

pub const HEADER_VERTICES_LIST_OFFSET: u64 = 4;
pub const HEADER_EDGES_LIST_OFFSET: u64 = 4 + LIST_SIZE;

pub const VERTEX_LABELS_LIST_OFFSET: u64 = 0;
pub const VERTEX_ATTRIBUTES_LIST_OFFSET: u64 = LIST_SIZE;

/// A list's head/tail offsets. Offset `0` means "no node" (never a valid
/// node offset, since the file's first four bytes are the signature).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawList {
    pub head: u64,
    pub tail: u64,
}

/// One node of an intrusive singly-linked list: the next node's offset and
/// the offset of the value this node carries (a vertex/edge/label/attribute
/// record, depending on which list the node belongs to).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListNode {
    pub next: u64,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Header {
    pub vertices: RawList,
    pub edges: RawList,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexRecord {
    pub labels: RawList,
    pub attributes: RawList,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeRecord {
    pub label: u64,
    pub source: u64,
    pub destination: u64,
}

fn read_exact_at(file: &File, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match file.read_at(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "unexpected end of storage file",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn write_all_at(file: &File, mut offset: u64, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match file.write_at(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "failed to write whole buffer to storage file",
                ))
            }
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

pub fn file_len(file: &File) -> io::Result<u64> {
    file.metadata().map(|m| m.len())
}

/// Appends `bytes` at the current end of the file and returns the offset it
/// was written at, the way `go_to_end` plus a write does in `storage.c`.
pub fn append(file: &File, bytes: &[u8]) -> io::Result<u64> {
    let offset = file_len(file)?;
    write_all_at(file, offset, bytes)?;
    Ok(offset)
}

pub fn read_u64_at(file: &File, offset: u64) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    read_exact_at(file, offset, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn write_u64_at(file: &File, offset: u64, value: u64) -> io::Result<()> {
    write_all_at(file, offset, &value.to_le_bytes())
}

pub fn read_signature(file: &File) -> io::Result<[u8; 4]> {
    let mut buf = [0u8; 4];
    read_exact_at(file, 0, &mut buf)?;
    Ok(buf)
}

pub fn read_list_at(file: &File, offset: u64) -> io::Result<RawList> {
    Ok(RawList {
        head: read_u64_at(file, offset)?,
        tail: read_u64_at(file, offset + 8)?,
    })
}

pub fn write_list_at(file: &File, offset: u64, list: RawList) -> io::Result<()> {
    let mut buf = BytesMut::with_capacity(LIST_SIZE as usize);
    buf.put_u64_le(list.head);
    buf.put_u64_le(list.tail);
    write_all_at(file, offset, &buf)
}

pub fn read_node_at(file: &File, offset: u64) -> io::Result<ListNode> {
    Ok(ListNode {
        next: read_u64_at(file, offset)?,
        value: read_u64_at(file, offset + 8)?,
    })
}

pub fn write_node_at(file: &File, offset: u64, node: ListNode) -> io::Result<()> {
    let mut buf = BytesMut::with_capacity(NODE_SIZE as usize);
    buf.put_u64_le(node.next);
    buf.put_u64_le(node.value);
    write_all_at(file, offset, &buf)
}

pub fn append_node(file: &File, node: ListNode) -> io::Result<u64> {
    let mut buf = BytesMut::with_capacity(NODE_SIZE as usize);
    buf.put_u64_le(node.next);
    buf.put_u64_le(node.value);
    append(file, &buf)
}

pub fn read_header(file: &File) -> io::Result<Header> {
    Ok(Header {
        vertices: read_list_at(file, HEADER_VERTICES_LIST_OFFSET)?,
        edges: read_list_at(file, HEADER_EDGES_LIST_OFFSET)?,
    })
}

pub fn write_header(file: &File, header: Header) -> io::Result<()> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE as usize);
    buf.put_slice(SIGNATURE);
    buf.put_u64_le(header.vertices.head);
    buf.put_u64_le(header.vertices.tail);
    buf.put_u64_le(header.edges.head);
    buf.put_u64_le(header.edges.tail);
    write_all_at(file, 0, &buf)
}

pub fn read_vertex_record_at(file: &File, offset: u64) -> io::Result<VertexRecord> {
    Ok(VertexRecord {
        labels: read_list_at(file, offset + VERTEX_LABELS_LIST_OFFSET)?,
        attributes: read_list_at(file, offset + VERTEX_ATTRIBUTES_LIST_OFFSET)?,
    })
}

pub fn write_vertex_record_at(file: &File, offset: u64, record: VertexRecord) -> io::Result<()> {
    write_list_at(file, offset + VERTEX_LABELS_LIST_OFFSET, record.labels)?;
    write_list_at(
        file,
        offset + VERTEX_ATTRIBUTES_LIST_OFFSET,
        record.attributes,
    )
}

pub fn append_vertex_record(file: &File) -> io::Result<u64> {
    append(file, &[0u8; VERTEX_RECORD_SIZE as usize])
}

pub fn read_edge_record_at(file: &File, offset: u64) -> io::Result<EdgeRecord> {
    Ok(EdgeRecord {
        label: read_u64_at(file, offset)?,
        source: read_u64_at(file, offset + 8)?,
        destination: read_u64_at(file, offset + 16)?,
    })
}

pub fn write_edge_record_at(file: &File, offset: u64, record: EdgeRecord) -> io::Result<()> {
    let mut buf = BytesMut::with_capacity(EDGE_RECORD_SIZE as usize);
    buf.put_u64_le(record.label);
    buf.put_u64_le(record.source);
    buf.put_u64_le(record.destination);
    write_all_at(file, offset, &buf)
}

pub fn append_edge_record(file: &File) -> io::Result<u64> {
    append(file, &[0u8; EDGE_RECORD_SIZE as usize])
}

/// Reads a length-prefixed string at `offset`.
pub fn read_string_at(file: &File, offset: u64) -> io::Result<String> {
    let len = read_u64_at(file, offset)?;
    let mut buf = vec![0u8; len as usize];
    read_exact_at(file, offset + 8, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
}

/// Appends a standalone length-prefixed string (used for label names and
/// attribute values) and returns its offset.
pub fn append_string(file: &File, value: &str) -> io::Result<u64> {
    let bytes = value.as_bytes();
    let mut buf = BytesMut::with_capacity(8 + bytes.len());
    buf.put_u64_le(bytes.len() as u64);
    buf.put_slice(bytes);
    append(file, &buf)
}

/// An attribute record is its name, inlined, followed by a pointer to the
/// (separately stored) value string. Reading it returns the name and where
/// the value pointer lives, since callers need that offset to update it.
pub fn read_attribute_at(file: &File, offset: u64) -> io::Result<(String, u64, u64)> {
    let name = read_string_at(file, offset)?;
    let value_ptr_offset = offset + 8 + name.len() as u64;
    let value_ptr = read_u64_at(file, value_ptr_offset)?;
    Ok((name, value_ptr_offset, value_ptr))
}

/// Appends a new attribute record (name inline, value pointer following) and
/// returns its offset.
pub fn append_attribute(file: &File, name: &str, value_ptr: u64) -> io::Result<u64> {
    let name_bytes = name.as_bytes();
    let mut buf = BytesMut::with_capacity(8 + name_bytes.len() + 8);
    buf.put_u64_le(name_bytes.len() as u64);
    buf.put_slice(name_bytes);
    buf.put_u64_le(value_ptr);
    append(file, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn open_rw(tmp: &NamedTempFile) -> File {
        File::options()
            .read(true)
            .write(true)
            .open(tmp.path())
            .unwrap()
    }

    #[test]
    fn header_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let file = open_rw(&tmp);
        let header = Header {
            vertices: RawList { head: 4, tail: 90 },
            edges: RawList { head: 0, tail: 0 },
        };
        write_header(&file, header).unwrap();
        assert_eq!(read_signature(&file).unwrap(), *SIGNATURE);
        assert_eq!(read_header(&file).unwrap(), header);
    }

    #[test]
    fn string_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let file = open_rw(&tmp);
        let offset = append_string(&file, "hello graph").unwrap();
        assert_eq!(read_string_at(&file, offset).unwrap(), "hello graph");
    }

    #[test]
    fn attribute_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let file = open_rw(&tmp);
        let value_offset = append_string(&file, "Bob").unwrap();
        let attr_offset = append_attribute(&file, "name", value_offset).unwrap();
        let (name, value_ptr_offset, value_ptr) = read_attribute_at(&file, attr_offset).unwrap();
        assert_eq!(name, "name");
        assert_eq!(value_ptr, value_offset);
        write_u64_at(&file, value_ptr_offset, 0).unwrap();
        let (_, _, cleared) = read_attribute_at(&file, attr_offset).unwrap();
        assert_eq!(cleared, 0);
    }

    #[test]
    fn vertex_and_edge_records_round_trip() {
        let tmp = NamedTempFile::new().unwrap();
        let file = open_rw(&tmp);

        let voffset = append_vertex_record(&file).unwrap();
        let record = VertexRecord {
            labels: RawList { head: 1, tail: 2 },
            attributes: RawList { head: 3, tail: 4 },
        };
        write_vertex_record_at(&file, voffset, record).unwrap();
        assert_eq!(read_vertex_record_at(&file, voffset).unwrap(), record);

        let eoffset = append_edge_record(&file).unwrap();
        let edge = EdgeRecord {
            label: 5,
            source: 6,
            destination: 7,
        };
        write_edge_record_at(&file, eoffset, edge).unwrap();
        assert_eq!(read_edge_record_at(&file, eoffset).unwrap(), edge);
    }

    #[test]
    fn list_node_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let file = open_rw(&tmp);
        let offset = append_node(&file, ListNode { next: 0, value: 42 }).unwrap();
        assert_eq!(
            read_node_at(&file, offset).unwrap(),
            ListNode { next: 0, value: 42 }
        );
    }
}

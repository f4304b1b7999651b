//! Fixed binary response records and their byte-order conversion.
//!
//! Every response the shell sends has a fixed layout with multi-byte numeric
//! fields in big-endian order on the wire, with one exception. The
//! query-handle field of the query response travels in **native** byte order,
//! and clients echo it back the same way in retrieve requests. This asymmetry
//! is a preserved wire-format quirk of the shell protocol, not an oversight
//! in this crate: correcting it silently would break every deployed client.
//! Both the encode and decode sites flag it.
//!
//! The retrieve response is special in a second way: the execution engine
//! serializes the result set, header included, in native byte order
//! directly into the transport buffer, and the dispatch layer converts the
//! header fields to wire order in place afterwards. [`RetrieveHeader`]
//! carries helpers for both halves of that handshake.

use thiserror::Error;

use crate::status::Code;

/// Length in bytes of the query response record.
pub const QUERY_RSP_LEN: usize = 12;
/// Length in bytes of the retrieve response header.
pub const RETRIEVE_HEADER_LEN: usize = 22;
/// Length in bytes of the submit response header.
pub const SUBMIT_HEADER_LEN: usize = 20;
/// Length in bytes of one failed-block record in a submit response.
pub const SUBMIT_BLOCK_LEN: usize = 16;

/// Errors produced while encoding or decoding wire records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The buffer is smaller than the record being written or read.
    #[error("buffer too short: need {needed} bytes, have {have}")]
    ShortBuffer { needed: usize, have: usize },
}

impl WireError {
    fn short(needed: usize, have: usize) -> Self {
        Self::ShortBuffer { needed, have }
    }
}

fn check_len(buf: &[u8], needed: usize) -> Result<(), WireError> {
    if buf.len() < needed {
        return Err(WireError::short(needed, buf.len()));
    }
    Ok(())
}

/// Wire-visible handle identifying an in-flight or completed query.
///
/// The value is opaque to clients: they receive it in a query response and
/// echo it back in retrieve requests. A zero value means "no handle" and is
/// what failed queries carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryHandle(pub u64);

impl QueryHandle {
    /// The null handle carried by failed queries.
    pub const NULL: Self = Self(0);

    /// Whether this is the null handle.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Query response record: `{code: i32, handle: u64}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRsp {
    /// Engine result code; carries the query's outcome regardless of the
    /// transport status the response is sent with.
    pub code: Code,
    /// Handle for retrieving results; null when the query failed.
    pub handle: QueryHandle,
}

impl QueryRsp {
    /// Encodes the record into `buf`.
    ///
    /// The code is converted to wire order; the handle is written in native
    /// order (the preserved protocol quirk described in the module docs).
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ShortBuffer`] if `buf` is shorter than
    /// [`QUERY_RSP_LEN`].
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<(), WireError> {
        check_len(buf, QUERY_RSP_LEN)?;
        buf[0..4].copy_from_slice(&self.code.as_i32().to_be_bytes());
        // Quirk: native order, not wire order.
        buf[4..12].copy_from_slice(&self.handle.0.to_ne_bytes());
        Ok(())
    }

    /// Decodes a record previously written by [`QueryRsp::encode_into`].
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ShortBuffer`] if `buf` is shorter than
    /// [`QUERY_RSP_LEN`].
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        check_len(buf, QUERY_RSP_LEN)?;
        let mut code = [0_u8; 4];
        code.copy_from_slice(&buf[0..4]);
        let mut handle = [0_u8; 8];
        handle.copy_from_slice(&buf[4..12]);
        Ok(Self {
            code: Code::from_raw(i32::from_be_bytes(code)),
            // Quirk: the handle was written in native order.
            handle: QueryHandle(u64::from_ne_bytes(handle)),
        })
    }
}

/// Parses the wire handle a client echoes back in a retrieve request.
///
/// The payload is the 8-byte handle value in native order (the same quirk as
/// the outbound direction).
///
/// # Errors
///
/// Returns [`WireError::ShortBuffer`] for payloads shorter than 8 bytes.
pub fn decode_retrieve_request(payload: &[u8]) -> Result<QueryHandle, WireError> {
    check_len(payload, 8)?;
    let mut raw = [0_u8; 8];
    raw.copy_from_slice(&payload[0..8]);
    Ok(QueryHandle(u64::from_ne_bytes(raw)))
}

/// Encodes a retrieve request payload; the client side of the handshake.
pub fn encode_retrieve_request(handle: QueryHandle) -> Vec<u8> {
    handle.0.to_ne_bytes().to_vec()
}

/// Retrieve response header: `{rows: i32, precision: i16, offset: i64,
/// elapsed_us: i64}`, followed on the wire by the serialized result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetrieveHeader {
    /// Number of rows in the result set.
    pub rows: i32,
    /// Timestamp precision of the result set.
    pub precision: i16,
    /// Continuation offset for paged retrieval.
    pub offset: i64,
    /// Query execution time in microseconds.
    pub elapsed_us: i64,
}

impl RetrieveHeader {
    /// Writes the header fields in native order, the form the execution
    /// engine leaves in the buffer before wire conversion.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ShortBuffer`] if `buf` is shorter than
    /// [`RETRIEVE_HEADER_LEN`].
    pub fn write_native(&self, buf: &mut [u8]) -> Result<(), WireError> {
        check_len(buf, RETRIEVE_HEADER_LEN)?;
        buf[0..4].copy_from_slice(&self.rows.to_ne_bytes());
        buf[4..6].copy_from_slice(&self.precision.to_ne_bytes());
        buf[6..14].copy_from_slice(&self.offset.to_ne_bytes());
        buf[14..22].copy_from_slice(&self.elapsed_us.to_ne_bytes());
        Ok(())
    }

    /// Converts a native-order header to wire order in place.
    ///
    /// Only the four header fields are touched; the result-set bytes that
    /// follow are already in their wire form.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ShortBuffer`] if `buf` is shorter than
    /// [`RETRIEVE_HEADER_LEN`].
    pub fn to_wire_in_place(buf: &mut [u8]) -> Result<(), WireError> {
        check_len(buf, RETRIEVE_HEADER_LEN)?;
        swap_in_place::<4>(&mut buf[0..4]);
        swap_in_place::<2>(&mut buf[4..6]);
        swap_in_place::<8>(&mut buf[6..14]);
        swap_in_place::<8>(&mut buf[14..22]);
        Ok(())
    }

    /// Decodes a wire-order header.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ShortBuffer`] if `buf` is shorter than
    /// [`RETRIEVE_HEADER_LEN`].
    pub fn decode_wire(buf: &[u8]) -> Result<Self, WireError> {
        check_len(buf, RETRIEVE_HEADER_LEN)?;
        let mut rows = [0_u8; 4];
        rows.copy_from_slice(&buf[0..4]);
        let mut precision = [0_u8; 2];
        precision.copy_from_slice(&buf[4..6]);
        let mut offset = [0_u8; 8];
        offset.copy_from_slice(&buf[6..14]);
        let mut elapsed = [0_u8; 8];
        elapsed.copy_from_slice(&buf[14..22]);
        Ok(Self {
            rows: i32::from_be_bytes(rows),
            precision: i16::from_be_bytes(precision),
            offset: i64::from_be_bytes(offset),
            elapsed_us: i64::from_be_bytes(elapsed),
        })
    }
}

/// Reverses an `N`-byte field in place, converting native order to wire
/// order (or back) on any host.
fn swap_in_place<const N: usize>(field: &mut [u8]) {
    debug_assert_eq!(field.len(), N);
    if cfg!(target_endian = "little") {
        field.reverse();
    }
}

/// One failed block in a submit result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedBlock {
    /// Position of the block within the submitted batch.
    pub index: i32,
    /// Vnode the block was routed to.
    pub vnode_id: i32,
    /// Table the block addressed within the vnode.
    pub table_id: i32,
    /// Why the block failed.
    pub code: Code,
}

/// Result of a completed batch write, as reported by the write engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitOutcome {
    /// Overall result code; failure here means no per-block detail exists.
    pub code: Code,
    /// Rows received in the batch.
    pub rows_total: i32,
    /// Rows durably written.
    pub rows_affected: i32,
    /// Rows rejected.
    pub rows_failed: i32,
    /// Per-block failures, in batch order.
    pub blocks: Vec<FailedBlock>,
}

impl SubmitOutcome {
    /// Total wire length of the response encoding this outcome.
    pub fn wire_len(&self) -> usize {
        SUBMIT_HEADER_LEN + self.blocks.len() * SUBMIT_BLOCK_LEN
    }

    /// Encodes the outcome into `buf`, all fields in wire order.
    ///
    /// Layout: `{code, rows_total, rows_affected, rows_failed, block_count}`
    /// header followed by one `{index, vnode_id, table_id, code}` record per
    /// failed block.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ShortBuffer`] if `buf` is shorter than
    /// [`SubmitOutcome::wire_len`].
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<(), WireError> {
        check_len(buf, self.wire_len())?;
        let block_count = i32::try_from(self.blocks.len()).unwrap_or(i32::MAX);
        buf[0..4].copy_from_slice(&self.code.as_i32().to_be_bytes());
        buf[4..8].copy_from_slice(&self.rows_total.to_be_bytes());
        buf[8..12].copy_from_slice(&self.rows_affected.to_be_bytes());
        buf[12..16].copy_from_slice(&self.rows_failed.to_be_bytes());
        buf[16..20].copy_from_slice(&block_count.to_be_bytes());
        for (i, block) in self.blocks.iter().enumerate() {
            let at = SUBMIT_HEADER_LEN + i * SUBMIT_BLOCK_LEN;
            buf[at..at + 4].copy_from_slice(&block.index.to_be_bytes());
            buf[at + 4..at + 8].copy_from_slice(&block.vnode_id.to_be_bytes());
            buf[at + 8..at + 12].copy_from_slice(&block.table_id.to_be_bytes());
            buf[at + 12..at + 16].copy_from_slice(&block.code.as_i32().to_be_bytes());
        }
        Ok(())
    }

    /// Decodes a wire-order submit response.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ShortBuffer`] if `buf` does not hold the header
    /// and every block the header announces.
    pub fn decode_wire(buf: &[u8]) -> Result<Self, WireError> {
        check_len(buf, SUBMIT_HEADER_LEN)?;
        let read_i32 = |at: usize| {
            let mut raw = [0_u8; 4];
            raw.copy_from_slice(&buf[at..at + 4]);
            i32::from_be_bytes(raw)
        };
        let block_count = read_i32(16);
        let count = usize::try_from(block_count).unwrap_or(0);
        check_len(buf, SUBMIT_HEADER_LEN + count * SUBMIT_BLOCK_LEN)?;
        let blocks = (0..count)
            .map(|i| {
                let at = SUBMIT_HEADER_LEN + i * SUBMIT_BLOCK_LEN;
                FailedBlock {
                    index: read_i32(at),
                    vnode_id: read_i32(at + 4),
                    table_id: read_i32(at + 8),
                    code: Code::from_raw(read_i32(at + 12)),
                }
            })
            .collect();
        Ok(Self {
            code: Code::from_raw(read_i32(0)),
            rows_total: read_i32(4),
            rows_affected: read_i32(8),
            rows_failed: read_i32(12),
            blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn query_rsp_code_is_big_endian_handle_is_native() {
        let rsp = QueryRsp {
            code: Code::from_raw(0x0102_0304),
            handle: QueryHandle(0x1122_3344_5566_7788),
        };
        let mut buf = vec![0_u8; QUERY_RSP_LEN];
        rsp.encode_into(&mut buf).expect("encode");

        assert_eq!(&buf[0..4], &[0x01, 0x02, 0x03, 0x04]);
        // The handle bytes match the host's representation, not the wire's.
        assert_eq!(&buf[4..12], &0x1122_3344_5566_7788_u64.to_ne_bytes());

        assert_eq!(QueryRsp::decode(&buf).expect("decode"), rsp);
    }

    #[rstest]
    #[case::empty(0)]
    #[case::one_short(QUERY_RSP_LEN - 1)]
    fn query_rsp_rejects_short_buffer(#[case] len: usize) {
        let rsp = QueryRsp {
            code: Code::SUCCESS,
            handle: QueryHandle::NULL,
        };
        let mut buf = vec![0_u8; len];
        assert_eq!(
            rsp.encode_into(&mut buf),
            Err(WireError::ShortBuffer {
                needed: QUERY_RSP_LEN,
                have: len
            })
        );
    }

    #[test]
    fn retrieve_request_round_trips_native_order() {
        let handle = QueryHandle(0xDEAD_BEEF_0000_0042);
        let payload = encode_retrieve_request(handle);
        assert_eq!(payload, handle.0.to_ne_bytes());
        assert_eq!(decode_retrieve_request(&payload), Ok(handle));
    }

    #[test]
    fn retrieve_request_rejects_short_payload() {
        assert!(matches!(
            decode_retrieve_request(&[1, 2, 3]),
            Err(WireError::ShortBuffer { needed: 8, have: 3 })
        ));
    }

    #[test]
    fn retrieve_header_native_then_wire_conversion() {
        let header = RetrieveHeader {
            rows: 512,
            precision: 3,
            offset: -1,
            elapsed_us: 42_000,
        };
        let mut buf = vec![0_u8; RETRIEVE_HEADER_LEN + 10];
        header.write_native(&mut buf).expect("write native");
        RetrieveHeader::to_wire_in_place(&mut buf).expect("to wire");

        assert_eq!(&buf[0..4], &512_i32.to_be_bytes());
        assert_eq!(&buf[4..6], &3_i16.to_be_bytes());
        assert_eq!(&buf[6..14], &(-1_i64).to_be_bytes());
        assert_eq!(&buf[14..22], &42_000_i64.to_be_bytes());

        assert_eq!(RetrieveHeader::decode_wire(&buf), Ok(header));
    }

    #[test]
    fn retrieve_conversion_leaves_result_bytes_alone() {
        let mut buf = vec![0_u8; RETRIEVE_HEADER_LEN];
        buf.extend_from_slice(b"row-data");
        RetrieveHeader::default()
            .write_native(&mut buf)
            .expect("write native");
        RetrieveHeader::to_wire_in_place(&mut buf).expect("to wire");
        assert_eq!(&buf[RETRIEVE_HEADER_LEN..], b"row-data");
    }

    #[test]
    fn submit_outcome_encodes_header_and_blocks_big_endian() {
        let outcome = SubmitOutcome {
            code: Code::SUCCESS,
            rows_total: 100,
            rows_affected: 98,
            rows_failed: 2,
            blocks: vec![
                FailedBlock {
                    index: 0,
                    vnode_id: 7,
                    table_id: 0,
                    code: Code::INVALID_VNODE_ID,
                },
                FailedBlock {
                    index: 1,
                    vnode_id: 7,
                    table_id: 12,
                    code: Code::NOT_ACTIVE_TABLE,
                },
            ],
        };
        assert_eq!(outcome.wire_len(), SUBMIT_HEADER_LEN + 2 * SUBMIT_BLOCK_LEN);

        let mut buf = vec![0_u8; outcome.wire_len()];
        outcome.encode_into(&mut buf).expect("encode");

        assert_eq!(&buf[16..20], &2_i32.to_be_bytes());
        assert_eq!(&buf[20..24], &0_i32.to_be_bytes());
        assert_eq!(&buf[24..28], &7_i32.to_be_bytes());
        assert_eq!(
            &buf[32..36],
            &Code::INVALID_VNODE_ID.as_i32().to_be_bytes()
        );

        assert_eq!(SubmitOutcome::decode_wire(&buf), Ok(outcome));
    }

    #[test]
    fn submit_outcome_without_blocks_is_header_only() {
        let outcome = SubmitOutcome {
            code: Code::SUCCESS,
            rows_total: 10,
            rows_affected: 10,
            rows_failed: 0,
            blocks: Vec::new(),
        };
        assert_eq!(outcome.wire_len(), SUBMIT_HEADER_LEN);

        let mut buf = vec![0_u8; SUBMIT_HEADER_LEN];
        outcome.encode_into(&mut buf).expect("encode");
        assert_eq!(SubmitOutcome::decode_wire(&buf), Ok(outcome));
    }
}

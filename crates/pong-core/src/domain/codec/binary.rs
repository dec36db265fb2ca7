use super::{DecodedPing, PingCodec, PingCredential, PingFormat, SerializationError};
use crate::domain::certificate::Certificate;
use bytes::{Buf, BufMut, BytesMut};
use uuid::Uuid;

/// Width of the id field in a binary ping.
pub const BINARY_ID_LENGTH: usize = 36;

const LENGTH_PREFIX: usize = 2;

/// Legacy binary ping codec.
///
/// The id is taken as raw bytes and never validated as a UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryPingCodec;

impl BinaryPingCodec {
    /// Serialize a ping. A UUID v4 string is used when `id` is `None`.
    pub fn encode(
        &self,
        pda: &Certificate,
        id: Option<&[u8]>,
    ) -> Result<Vec<u8>, SerializationError> {
        let generated;
        let id = match id {
            Some(id) if id.len() != BINARY_ID_LENGTH => {
                return Err(SerializationError::InvalidIdLength { actual: id.len() })
            }
            Some(id) => id,
            None => {
                generated = Uuid::new_v4().to_string();
                generated.as_bytes()
            }
        };

        let pda = pda.as_der();
        let pda_length = u16::try_from(pda.len())
            .map_err(|_| SerializationError::PdaTooLarge { actual: pda.len() })?;

        let mut frame = BytesMut::with_capacity(BINARY_ID_LENGTH + LENGTH_PREFIX + pda.len());
        frame.put_slice(id);
        frame.put_u16_le(pda_length);
        frame.put_slice(pda);
        Ok(frame.to_vec())
    }
}

impl PingCodec for BinaryPingCodec {
    fn decode(&self, serialized: &[u8]) -> Result<DecodedPing, SerializationError> {
        let mut frame = serialized;
        if frame.remaining() < BINARY_ID_LENGTH + LENGTH_PREFIX {
            return Err(SerializationError::InvalidFrame(format!(
                "frame spans {} octets but its header needs {}",
                frame.remaining(),
                BINARY_ID_LENGTH + LENGTH_PREFIX
            )));
        }

        let id = frame[..BINARY_ID_LENGTH].to_vec();
        frame.advance(BINARY_ID_LENGTH);

        let pda_length = usize::from(frame.get_u16_le());
        if frame.remaining() != pda_length {
            return Err(SerializationError::InvalidFrame(format!(
                "PDA length prefix is {pda_length} but {} octets follow",
                frame.remaining()
            )));
        }

        let pda = Certificate::from_der(frame).map_err(SerializationError::InvalidPda)?;
        Ok(DecodedPing {
            id,
            credential: PingCredential::Pda(pda),
        })
    }

    fn format(&self) -> PingFormat {
        PingFormat::Binary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generate_certificate;
    use proptest::prelude::*;
    use std::sync::OnceLock;

    fn pda() -> &'static Certificate {
        static PDA: OnceLock<Certificate> = OnceLock::new();
        PDA.get_or_init(|| Certificate::from_der(&generate_certificate("pda")).unwrap())
    }

    #[test]
    fn test_frame_layout() {
        let id = [b'a'; BINARY_ID_LENGTH];
        let frame = BinaryPingCodec.encode(pda(), Some(&id)).unwrap();

        let pda_len = pda().as_der().len();
        assert_eq!(&frame[..BINARY_ID_LENGTH], &id);
        assert_eq!(
            &frame[BINARY_ID_LENGTH..BINARY_ID_LENGTH + 2],
            &(pda_len as u16).to_le_bytes()
        );
        assert_eq!(&frame[BINARY_ID_LENGTH + 2..], pda().as_der());
    }

    #[test]
    fn test_encode_generates_uuid_when_id_absent() {
        let frame = BinaryPingCodec.encode(pda(), None).unwrap();
        let ping = BinaryPingCodec.decode(&frame).unwrap();

        assert_eq!(ping.id.len(), BINARY_ID_LENGTH);
        assert!(Uuid::parse_str(std::str::from_utf8(&ping.id).unwrap()).is_ok());
    }

    #[test]
    fn test_encode_rejects_wrong_id_length() {
        for length in [35, 37] {
            let id = vec![b'x'; length];
            let err = BinaryPingCodec.encode(pda(), Some(&id)).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Ping id should span 36 octets (got {length})")
            );
        }
    }

    #[test]
    fn test_decode_short_frame() {
        let err = BinaryPingCodec.decode(&[0u8; 10]).unwrap_err();
        assert!(err.to_string().starts_with("Invalid ping serialization: "));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut frame = BinaryPingCodec.encode(pda(), None).unwrap();
        frame.truncate(frame.len() - 1);

        let err = BinaryPingCodec.decode(&frame).unwrap_err();
        assert!(matches!(err, SerializationError::InvalidFrame(_)));
    }

    #[test]
    fn test_decode_invalid_pda() {
        let mut frame = vec![b'x'; BINARY_ID_LENGTH];
        frame.extend_from_slice(&3u16.to_le_bytes());
        frame.extend_from_slice(b"bad");

        let err = BinaryPingCodec.decode(&frame).unwrap_err();
        assert!(err.to_string().starts_with("Invalid PDA serialization: "));
    }

    proptest! {
        #[test]
        fn prop_round_trip_accepts_any_36_octets(id in proptest::collection::vec(any::<u8>(), BINARY_ID_LENGTH)) {
            let frame = BinaryPingCodec.encode(pda(), Some(&id)).unwrap();
            let ping = BinaryPingCodec.decode(&frame).unwrap();

            prop_assert_eq!(ping.id, id);
            prop_assert_eq!(ping.credential, PingCredential::Pda(pda().clone()));
        }
    }
}

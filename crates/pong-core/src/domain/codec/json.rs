use super::{DecodedPing, PingCodec, PingCredential, PingFormat, SerializationError};
use crate::domain::path::CertificationPath;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use uuid::Uuid;

const ID_FIELD: &str = "id";
const PATH_FIELD: &str = "pda_path";

/// JSON ping codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPingCodec;

impl JsonPingCodec {
    /// Serialize a ping. A random UUID v4 is used when `id` is `None`.
    pub fn encode(
        &self,
        path: &CertificationPath,
        id: Option<&str>,
    ) -> Result<Vec<u8>, SerializationError> {
        let id = match id {
            Some("") => return Err(SerializationError::EmptyId),
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let path_der = path.serialize().map_err(SerializationError::EncodePath)?;
        let ping = json!({
            ID_FIELD: id,
            PATH_FIELD: STANDARD.encode(path_der),
        });
        serde_json::to_vec(&ping).map_err(SerializationError::Encode)
    }
}

impl PingCodec for JsonPingCodec {
    fn decode(&self, serialized: &[u8]) -> Result<DecodedPing, SerializationError> {
        let value: Value =
            serde_json::from_slice(serialized).map_err(SerializationError::NotJson)?;

        let id = value
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or(SerializationError::MissingId)?;

        let encoded_path = value
            .get(PATH_FIELD)
            .and_then(Value::as_str)
            .ok_or(SerializationError::MissingPath)?;

        let path_der = STANDARD
            .decode(encoded_path)
            .map_err(SerializationError::PathNotBase64)?;
        if path_der.is_empty() {
            return Err(SerializationError::EmptyPath);
        }

        let path =
            CertificationPath::deserialize(&path_der).map_err(SerializationError::MalformedPath)?;

        Ok(DecodedPing {
            id: id.as_bytes().to_vec(),
            credential: PingCredential::Path(path),
        })
    }

    fn format(&self) -> PingFormat {
        PingFormat::Json
    }
}

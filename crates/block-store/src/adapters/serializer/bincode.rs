use sha2::{Digest, Sha256};
use shared_types::{Block, Hash};

use crate::domain::errors::SerializationError;
use crate::ports::outbound::BlockSerializer;

/// Default block serializer: bincode encoding, SHA-256 identity.
///
/// The content hash is taken over the exact bytes stored in the primary
/// record, so a stored value can always be checked against its key.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeBlockSerializer;

impl BlockSerializer for BincodeBlockSerializer {
    fn serialize(&self, block: &Block) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(block).map_err(|e| SerializationError {
            message: e.to_string(),
        })
    }

    fn deserialize(&self, data: &[u8]) -> Result<Block, SerializationError> {
        bincode::deserialize(data).map_err(|e| SerializationError {
            message: e.to_string(),
        })
    }

    fn hash_encoded(&self, encoded: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(encoded);
        hasher.finalize().into()
    }
}

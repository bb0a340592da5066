pub mod protocol;
pub mod serializer;

pub use protocol::{Request, Response};
pub use serializer::{Deserialize, Deserializer, SerializationError, Serialize, Serializer};

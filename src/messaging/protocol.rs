//! Request and reply messages exchanged with the name server and workers.
//!
//! Each message is one tag byte followed by its fields in declaration order,
//! encoded with [`Serializer`].

use super::serializer::{Deserialize, Deserializer, SerializationError, Serialize, Serializer};
use crate::services::WorkerInfo;

const TAG_REGISTER: u8 = 1;
const TAG_DEREGISTER: u8 = 2;
const TAG_LOOKUP: u8 = 3;
const TAG_FIBONACCI: u8 = 4;
const TAG_COUNTER: u8 = 5;
const TAG_FAULT: u8 = 0xFF;

#[derive(Clone, Debug, PartialEq)]
pub struct RegisterArgs {
    pub address: String,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeregisterArgs {
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct LookupArgs {
    pub service_name: String,
}

/// Reply to Register and Deregister.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusReply {
    pub success: bool,
    pub message: String,
}

impl StatusReply {
    pub fn success(message: impl Into<String>) -> Self {
        StatusReply {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        StatusReply {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct LookupReply {
    pub servers: Vec<WorkerInfo>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FibonacciArgs {
    pub n: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FibonacciReply {
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CounterArgs {
    pub key: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CounterReply {
    pub count: i64,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    Register(RegisterArgs),
    Deregister(DeregisterArgs),
    Lookup(LookupArgs),
    Fibonacci(FibonacciArgs),
    Counter(CounterArgs),
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Request::Register(_) => "NameServer.Register",
            Request::Deregister(_) => "NameServer.Deregister",
            Request::Lookup(_) => "NameServer.Lookup",
            Request::Fibonacci(_) => "Arithmetic.Fibonacci",
            Request::Counter(_) => "Counter.Counter",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Register(StatusReply),
    Deregister(StatusReply),
    Lookup(LookupReply),
    Fibonacci(FibonacciReply),
    Counter(CounterReply),
    /// The handler failed; carries its error message.
    Fault(String),
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, SerializationError> {
    let mut serializer = Serializer::new();
    serializer.write(message)?;
    Ok(serializer.into_bytes())
}

/// Decodes exactly one message; trailing bytes are an error.
pub fn decode<T: Deserialize>(data: &[u8]) -> Result<T, SerializationError> {
    let mut deserializer = Deserializer::new(data);
    let message = deserializer.read()?;
    deserializer.finish()?;
    Ok(message)
}

impl Serialize for WorkerInfo {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
        serializer.write(&self.address)?;
        serializer.write(&self.port)?;
        serializer.write(&self.weight)
    }
}

impl Deserialize for WorkerInfo {
    // address and port prefixes plus the weight
    const MIN_ENCODED_SIZE: usize = 4 + 4 + 8;

    fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError> {
        Ok(WorkerInfo {
            address: deserializer.read()?,
            port: deserializer.read()?,
            weight: deserializer.read()?,
        })
    }
}

impl Serialize for StatusReply {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
        serializer.write(&self.success)?;
        serializer.write(&self.message)
    }
}

impl Deserialize for StatusReply {
    fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError> {
        Ok(StatusReply {
            success: deserializer.read()?,
            message: deserializer.read()?,
        })
    }
}

impl Serialize for Request {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
        match self {
            Request::Register(args) => {
                serializer.write(&TAG_REGISTER)?;
                serializer.write(&args.address)?;
                serializer.write(&args.weight)
            }
            Request::Deregister(args) => {
                serializer.write(&TAG_DEREGISTER)?;
                serializer.write(&args.address)
            }
            Request::Lookup(args) => {
                serializer.write(&TAG_LOOKUP)?;
                serializer.write(&args.service_name)
            }
            Request::Fibonacci(args) => {
                serializer.write(&TAG_FIBONACCI)?;
                serializer.write(&args.n)
            }
            Request::Counter(args) => {
                serializer.write(&TAG_COUNTER)?;
                serializer.write(&args.key)
            }
        }
    }
}

impl Deserialize for Request {
    fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError> {
        let request = match deserializer.read::<u8>()? {
            TAG_REGISTER => Request::Register(RegisterArgs {
                address: deserializer.read()?,
                weight: deserializer.read()?,
            }),
            TAG_DEREGISTER => Request::Deregister(DeregisterArgs {
                address: deserializer.read()?,
            }),
            TAG_LOOKUP => Request::Lookup(LookupArgs {
                service_name: deserializer.read()?,
            }),
            TAG_FIBONACCI => Request::Fibonacci(FibonacciArgs {
                n: deserializer.read()?,
            }),
            TAG_COUNTER => Request::Counter(CounterArgs {
                key: deserializer.read()?,
            }),
            tag => return Err(SerializationError::UnknownTag(tag)),
        };
        Ok(request)
    }
}

impl Serialize for Response {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
        match self {
            Response::Register(reply) => {
                serializer.write(&TAG_REGISTER)?;
                serializer.write(reply)
            }
            Response::Deregister(reply) => {
                serializer.write(&TAG_DEREGISTER)?;
                serializer.write(reply)
            }
            Response::Lookup(reply) => {
                serializer.write(&TAG_LOOKUP)?;
                serializer.write(&reply.servers)
            }
            Response::Fibonacci(reply) => {
                serializer.write(&TAG_FIBONACCI)?;
                serializer.write(&reply.value)
            }
            Response::Counter(reply) => {
                serializer.write(&TAG_COUNTER)?;
                serializer.write(&reply.count)?;
                serializer.write(&reply.message)
            }
            Response::Fault(message) => {
                serializer.write(&TAG_FAULT)?;
                serializer.write(message)
            }
        }
    }
}

impl Deserialize for Response {
    fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError> {
        let response = match deserializer.read::<u8>()? {
            TAG_REGISTER => Response::Register(deserializer.read()?),
            TAG_DEREGISTER => Response::Deregister(deserializer.read()?),
            TAG_LOOKUP => Response::Lookup(LookupReply {
                servers: deserializer.read()?,
            }),
            TAG_FIBONACCI => Response::Fibonacci(FibonacciReply {
                value: deserializer.read()?,
            }),
            TAG_COUNTER => Response::Counter(CounterReply {
                count: deserializer.read()?,
                message: deserializer.read()?,
            }),
            TAG_FAULT => Response::Fault(deserializer.read()?),
            tag => return Err(SerializationError::UnknownTag(tag)),
        };
        Ok(response)
    }
}

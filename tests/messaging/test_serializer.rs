use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use tiny_nameserver::messaging::{Deserialize, Deserializer, SerializationError, Serialize, Serializer};
use tiny_nameserver::WorkerInfo;

// Remembers the largest single allocation made by this test binary.
struct LargestAllocation;

static LARGEST: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for LargestAllocation {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        LARGEST.fetch_max(layout.size(), Ordering::Relaxed);
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        LARGEST.fetch_max(new_size, Ordering::Relaxed);
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static ALLOCATOR: LargestAllocation = LargestAllocation;

#[test]
fn test_serialize_deserialize_multiple_values() {
    let mut serializer = Serializer::new();
    42i32.serialize(&mut serializer).expect("Failed to serialize i32");
    3.14159f64.serialize(&mut serializer).expect("Failed to serialize f64");
    false.serialize(&mut serializer).expect("Failed to serialize bool");
    String::from("Test").serialize(&mut serializer).expect("Failed to serialize String");
    7u8.serialize(&mut serializer).expect("Failed to serialize u8");
    (-9i64).serialize(&mut serializer).expect("Failed to serialize i64");

    let data = serializer.into_bytes();
    let mut deserializer = Deserializer::new(&data);

    assert_eq!(i32::deserialize(&mut deserializer).unwrap(), 42);
    assert_eq!(f64::deserialize(&mut deserializer).unwrap(), 3.14159);
    assert!(!bool::deserialize(&mut deserializer).unwrap());
    assert_eq!(String::deserialize(&mut deserializer).unwrap(), "Test");
    assert_eq!(u8::deserialize(&mut deserializer).unwrap(), 7);
    assert_eq!(i64::deserialize(&mut deserializer).unwrap(), -9);
    assert!(!deserializer.has_more());
}

#[test]
fn test_little_endian_layout() {
    let mut serializer = Serializer::new();
    serializer.write("hi").unwrap();
    assert_eq!(serializer.into_bytes(), vec![2, 0, 0, 0, b'h', b'i']);
}

#[test]
fn test_vec_of_strings() {
    let values = vec![String::from("a"), String::new(), String::from("ccc")];
    let mut serializer = Serializer::new();
    serializer.write(&values).unwrap();

    let bytes = serializer.into_bytes();
    let mut deserializer = Deserializer::new(&bytes);
    let decoded: Vec<String> = deserializer.read().unwrap();
    assert_eq!(decoded, values);
    deserializer.finish().unwrap();
}

#[test]
fn test_negative_length_is_rejected() {
    let bytes = (-1i32).to_le_bytes();
    let mut deserializer = Deserializer::new(&bytes);
    assert!(matches!(
        String::deserialize(&mut deserializer),
        Err(SerializationError::InvalidLength(-1))
    ));
}

#[test]
fn test_length_beyond_buffer_is_rejected() {
    let mut bytes = i32::MAX.to_le_bytes().to_vec();
    bytes.extend_from_slice(b"short");
    let mut deserializer = Deserializer::new(&bytes);
    assert!(matches!(
        Vec::<String>::deserialize(&mut deserializer),
        Err(SerializationError::BufferOverflow)
    ));
}

#[test]
fn test_truncated_input() {
    let bytes = [1u8, 2];
    let mut deserializer = Deserializer::new(&bytes);
    assert!(matches!(
        i32::deserialize(&mut deserializer),
        Err(SerializationError::IoError(_))
    ));
}

#[test]
fn test_finish_reports_trailing_bytes() {
    let bytes = [1u8, 0, 0, 0, 9, 9];
    let mut deserializer = Deserializer::new(&bytes);
    assert_eq!(i32::deserialize(&mut deserializer).unwrap(), 1);
    assert_eq!(deserializer.remaining(), 2);
    assert!(matches!(
        deserializer.finish(),
        Err(SerializationError::TrailingBytes(2))
    ));
}

#[test]
fn test_worker_count_checked_against_encoded_size() {
    // 1000 entries need at least 16 bytes each
    let mut bytes = 1000i32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[0u8; 1000]);
    let mut deserializer = Deserializer::new(&bytes);
    assert!(matches!(
        Vec::<WorkerInfo>::deserialize(&mut deserializer),
        Err(SerializationError::BufferOverflow)
    ));
}

#[test]
fn test_bogus_worker_count_does_not_preallocate() {
    let frame_size = 1 << 20;
    let mut bytes = 60_000i32.to_le_bytes().to_vec();
    // every address prefix decodes as -1
    bytes.resize(frame_size, 0xFF);

    LARGEST.store(0, Ordering::Relaxed);
    let mut deserializer = Deserializer::new(&bytes);
    let result = Vec::<WorkerInfo>::deserialize(&mut deserializer);
    let largest = LARGEST.load(Ordering::Relaxed);

    assert!(matches!(result, Err(SerializationError::InvalidLength(-1))));
    assert!(largest < frame_size / 4, "largest allocation {} bytes", largest);
}

pub mod blake3;

pub use self::blake3::Blake3Hasher;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Input too short")]
    UnexpectedEnd,
}

/// A trait that allows for decoding a structure from a byte sequence.
///
/// All multi-byte values on the wire are little-endian; the stream originates
/// on a little-endian MCU and this crate decodes it identically on every host.
pub trait Decode {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError>
    where
        Self: Sized;
}

impl Decode for () {
    fn decode(_data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(())
    }
}

macro_rules! impl_decode_for_primitive {
    ($($t:ty),*) => {
        $(
            impl Decode for $t {
                fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
                    let bytes = data.get(..size_of::<Self>()).ok_or(DecodeError::UnexpectedEnd)?;
                    *data = &data[size_of::<Self>()..];
                    Ok(Self::from_le_bytes(bytes.try_into().unwrap()))
                }
            }
        )*
    };
}

impl_decode_for_primitive!(u8, u16, u32, i8, i16, i32);

#[cfg(test)]
mod tests {
    use super::{Decode, DecodeError};

    #[test]
    fn little_endian() {
        let mut data: &[u8] = &[0xFF, 0x7F, 0x34, 0x12];
        assert_eq!(0x7FFF, u16::decode(&mut data).unwrap());
        assert_eq!(0x1234, u16::decode(&mut data).unwrap());
        assert!(data.is_empty());
    }

    #[test]
    fn short_input() {
        let mut data: &[u8] = &[0xFF];
        assert_eq!(Err(DecodeError::UnexpectedEnd), u16::decode(&mut data));
    }
}

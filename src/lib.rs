//! Crate for capturing and decoding the raw video stream of a GreatFET TAXI
//! interface. Not affiliated with Great Scott Gadgets.
//!
//! The TAXI sensor streams 245x327 frames of 16-bit samples with no framing
//! beyond a run of `0x7FFF` padding words between images. The heart of this
//! crate is [`sync::FrameSynchronizer`], which locates frame boundaries in an
//! accumulating byte buffer and yields [`frame::Frame`]s whose alignment
//! sentinel checks out. [`render::Levels`] turns those into 8-bit images.
//!
//! With the `capture` feature, [`session::CaptureSession`] drives a
//! [`source::ByteSource`] through the synchronizer end to end, optionally
//! keeping a verbatim copy of the raw stream.

pub mod decode;
pub mod frame;
pub mod render;
pub mod sync;

#[cfg(feature = "capture")]
pub mod session;
#[cfg(feature = "capture")]
pub mod source;

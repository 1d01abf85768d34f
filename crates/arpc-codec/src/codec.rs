use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::resp::{encode, parse, FrameError, Resp};

/// A [`tokio_util::codec`] pair that frames a byte stream into [`Resp`]
/// values, one complete value per `decode` call, accepting buffered
/// partial reads across many poll cycles.
#[derive(Debug, Default)]
pub struct RespCodec;

impl Decoder for RespCodec {
    type Item = Resp;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match parse(src)? {
            Some((value, consumed)) => {
                src.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<Resp> for RespCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Resp, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buf = Vec::new();
        encode(&item, &mut buf);
        dst.extend_from_slice(&buf);
        Ok(())
    }
}

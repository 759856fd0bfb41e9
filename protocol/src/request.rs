use common::err::CResult;
use wire::OutputBuffer;

use crate::op_id::OpId;

/// A server operation's request half: the 6-step shape of §4.4 boils
/// down, per call, to "what's my op id" and "how do I pack my
/// arguments". `protocol::dispatch` owns steps 2-5 (buffer sizing,
/// transmit, receive, status translation) generically across every
/// implementor.
pub trait Request {
    type Reply;

    fn op_id(&self) -> OpId;

    /// Packs this request's typed arguments into the request's
    /// `arg_region` (§6) using A (`wire`) + B (`dbtype`).
    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()>;

    /// `true` for fire-and-forget calls (e.g. `set_interrupt`,
    /// `checkpoint_trigger`): the dispatcher does not wait for a reply
    /// frame at all.
    fn no_reply(&self) -> bool {
        false
    }

    /// Unpacks the reply: `reply_region` is the fixed-layout scalar
    /// area (status word already stripped off and passed separately),
    /// `reply_data` is the `reply_data[0..m]` variable-sized blocks —
    /// zero, one, or two plain data blocks, or a single block holding a
    /// Copy Area or Log Page image for the shapes that carry one.
    fn decode_reply(status: i32, reply_region: &[u8], reply_data: &[Vec<u8>]) -> CResult<Self::Reply>;
}

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The closed catalogue of remote procedures, one 4-byte operation id
/// per wire call (§6). `network_interface_cl.h` names roughly 120; this
/// implements a representative, complete-per-reply-shape subset (§4.4's
/// supplement) so every shape — no-reply, unary, reply+1/2 blocks,
/// reply+Copy Area, reply+Log Page, reply+callback — has at least one
/// concrete RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum OpId {
    // --- Transaction manager (F) ---
    TranServerCommit = 1,
    TranServerAbort = 2,
    TranServerPartialAbort = 3,
    TranServerSavepoint = 4,
    TranResetIsolation = 5,
    TranResetWaitTimes = 6,
    TranServerStartTopop = 7,
    TranServerEndTopop = 8,

    // --- Two-phase commit ---
    Tran2pcStart = 20,
    Tran2pcPrepare = 21,
    Tran2pcRecoveryPrepared = 22,
    Tran2pcAttachGlobalTran = 23,

    // --- Loose-end (deferred log action) drain ---
    LogClientGetFirstPostpone = 30,
    LogClientGetNextPostpone = 31,
    LogClientGetFirstUndo = 32,
    LogClientGetNextUndo = 33,
    LogHasFinishedClientPostpone = 34,
    LogHasFinishedClientUndo = 35,

    // --- Object/workspace (E, D) ---
    LocatorFetch = 40,
    LocatorForce = 41,

    // --- Query execution (reply + 2 data blocks) ---
    QueryExecute = 50,

    // --- No-reply / fire-and-forget ---
    SetInterrupt = 60,
    CheckpointTrigger = 61,

    // --- Log-writer follower (G) ---
    FetchLogPages = 70,

    // --- HA / admin ---
    ChangeMode = 80,
}

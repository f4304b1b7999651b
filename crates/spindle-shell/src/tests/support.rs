//! Shared fixtures and capturing fakes for behaviour tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rstest::fixture;

use spindle_protocol::wire::{QueryHandle, QueryRsp, RETRIEVE_HEADER_LEN, RetrieveHeader, SubmitOutcome};
use spindle_protocol::{Code, ConnId, InboundMessage, MsgKind};

use crate::engines::{
    EngineHandle, HttpStats, MetaClient, QueryCompletion, QueryEngine, RetrieveCompletion,
    RunState, RunStateSource, SubmitCompletion, WriteEngine,
};
use crate::transport::ShellTransport;
use crate::{Collaborators, Shell, ShellConfig};

/// Connection used by most scenarios.
pub(crate) const CONN: ConnId = ConnId(42);

/// One captured `send_response` call.
#[derive(Debug, Clone)]
pub(crate) struct SentResponse {
    pub conn: ConnId,
    pub status: Code,
    pub payload: Vec<u8>,
}

/// Transport fake capturing every response and optionally refusing buffers.
#[derive(Default)]
pub(crate) struct FakeTransport {
    pub fail_alloc: AtomicBool,
    sent: Mutex<Vec<SentResponse>>,
}

impl FakeTransport {
    pub(crate) fn sent(&self) -> Vec<SentResponse> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn take_sent(&self) -> Vec<SentResponse> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// The single response a scenario expects to have produced.
    pub(crate) fn only_response(&self) -> SentResponse {
        let sent = self.sent();
        assert_eq!(sent.len(), 1, "expected exactly one response, got {sent:?}");
        sent[0].clone()
    }
}

impl ShellTransport for FakeTransport {
    fn alloc_response(&self, len: usize) -> Option<Vec<u8>> {
        if self.fail_alloc.load(Ordering::Relaxed) {
            None
        } else {
            Some(vec![0; len])
        }
    }

    fn send_response(&self, conn: ConnId, status: Code, payload: Vec<u8>) {
        self.sent.lock().unwrap().push(SentResponse {
            conn,
            status,
            payload,
        });
    }
}

/// Query-engine fake with scripted completions.
///
/// Completions run inline by default; with `complete_on_thread` set they run
/// on a freshly spawned thread instead, proving the continuations carry no
/// thread-local assumptions.
pub(crate) struct FakeQueryEngine {
    pub complete_on_thread: AtomicBool,
    pub submit_code: Mutex<Code>,
    pub submit_handle: Mutex<Option<EngineHandle>>,
    pub retrieve_code: Mutex<Code>,
    pub result_size: AtomicUsize,
    pub serialize_code: Mutex<Code>,
    pub header: Mutex<RetrieveHeader>,
    pub body: Mutex<Vec<u8>>,
    pub released: Mutex<Vec<EngineHandle>>,
    pub submit_calls: AtomicUsize,
    pub retrieve_calls: AtomicUsize,
}

impl Default for FakeQueryEngine {
    fn default() -> Self {
        Self {
            complete_on_thread: AtomicBool::new(false),
            submit_code: Mutex::new(Code::SUCCESS),
            submit_handle: Mutex::new(Some(EngineHandle(0xE1))),
            retrieve_code: Mutex::new(Code::SUCCESS),
            result_size: AtomicUsize::new(RETRIEVE_HEADER_LEN),
            serialize_code: Mutex::new(Code::SUCCESS),
            header: Mutex::new(RetrieveHeader::default()),
            body: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
            submit_calls: AtomicUsize::new(0),
            retrieve_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeQueryEngine {
    pub(crate) fn released(&self) -> Vec<EngineHandle> {
        self.released.lock().unwrap().clone()
    }

    fn run(&self, completion: impl FnOnce() + Send + 'static) {
        if self.complete_on_thread.load(Ordering::Relaxed) {
            std::thread::spawn(completion)
                .join()
                .expect("completion thread");
        } else {
            completion();
        }
    }
}

impl QueryEngine for FakeQueryEngine {
    fn submit_query(&self, _descriptor: Vec<u8>, done: QueryCompletion) {
        self.submit_calls.fetch_add(1, Ordering::Relaxed);
        let code = *self.submit_code.lock().unwrap();
        let handle = *self.submit_handle.lock().unwrap();
        self.run(move || done(code, handle));
    }

    fn retrieve(&self, _handle: EngineHandle, done: RetrieveCompletion) {
        self.retrieve_calls.fetch_add(1, Ordering::Relaxed);
        let code = *self.retrieve_code.lock().unwrap();
        self.run(move || done(code));
    }

    fn result_size(&self, _handle: EngineHandle) -> usize {
        self.result_size.load(Ordering::Relaxed)
    }

    fn serialize_result(&self, _handle: EngineHandle, out: &mut [u8]) -> Code {
        let code = *self.serialize_code.lock().unwrap();
        self.header
            .lock()
            .unwrap()
            .write_native(out)
            .expect("result buffer fits header");
        if code.is_success() {
            let body = self.body.lock().unwrap();
            out[RETRIEVE_HEADER_LEN..RETRIEVE_HEADER_LEN + body.len()].copy_from_slice(&body);
        }
        code
    }

    fn release(&self, handle: EngineHandle) {
        self.released.lock().unwrap().push(handle);
    }
}

/// Write-engine fake completing with a scripted outcome.
pub(crate) struct FakeWriteEngine {
    pub outcome: Mutex<SubmitOutcome>,
    pub submit_calls: AtomicUsize,
}

impl Default for FakeWriteEngine {
    fn default() -> Self {
        Self {
            outcome: Mutex::new(SubmitOutcome::default()),
            submit_calls: AtomicUsize::new(0),
        }
    }
}

impl WriteEngine for FakeWriteEngine {
    fn submit_write(&self, _batch: Vec<u8>, done: SubmitCompletion) {
        self.submit_calls.fetch_add(1, Ordering::Relaxed);
        let outcome = self.outcome.lock().unwrap().clone();
        done(outcome);
    }
}

/// Metadata-client fake recording every refresh request.
#[derive(Default)]
pub(crate) struct FakeMeta {
    vnode_refreshes: Mutex<Vec<i32>>,
    table_refreshes: Mutex<Vec<(i32, i32)>>,
}

impl FakeMeta {
    pub(crate) fn vnode_refreshes(&self) -> Vec<i32> {
        self.vnode_refreshes.lock().unwrap().clone()
    }

    pub(crate) fn table_refreshes(&self) -> Vec<(i32, i32)> {
        self.table_refreshes.lock().unwrap().clone()
    }
}

impl MetaClient for FakeMeta {
    fn refresh_vnode_config(&self, vnode_id: i32) {
        self.vnode_refreshes.lock().unwrap().push(vnode_id);
    }

    fn refresh_table_config(&self, vnode_id: i32, table_id: i32) {
        self.table_refreshes.lock().unwrap().push((vnode_id, table_id));
    }
}

/// HTTP-statistics fake with a settable cumulative count.
#[derive(Default)]
pub(crate) struct FakeHttpStats {
    pub count: AtomicU64,
}

impl HttpStats for FakeHttpStats {
    fn request_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Run-state fake, `Running` unless a scenario says otherwise.
pub(crate) struct FakeRunState {
    state: Mutex<RunState>,
}

impl Default for FakeRunState {
    fn default() -> Self {
        Self {
            state: Mutex::new(RunState::Running),
        }
    }
}

impl FakeRunState {
    pub(crate) fn set(&self, state: RunState) {
        *self.state.lock().unwrap() = state;
    }
}

impl RunStateSource for FakeRunState {
    fn run_state(&self) -> RunState {
        *self.state.lock().unwrap()
    }
}

/// A shell wired to capturing fakes.
pub(crate) struct Harness {
    pub shell: Shell,
    pub transport: Arc<FakeTransport>,
    pub query: Arc<FakeQueryEngine>,
    pub write: Arc<FakeWriteEngine>,
    pub meta: Arc<FakeMeta>,
    pub http: Arc<FakeHttpStats>,
    pub run_state: Arc<FakeRunState>,
}

impl Harness {
    pub(crate) fn with_config(config: &ShellConfig) -> Self {
        let transport = Arc::new(FakeTransport::default());
        let query = Arc::new(FakeQueryEngine::default());
        let write = Arc::new(FakeWriteEngine::default());
        let meta = Arc::new(FakeMeta::default());
        let http = Arc::new(FakeHttpStats::default());
        let run_state = Arc::new(FakeRunState::default());
        let shell = Shell::new(
            config,
            Collaborators {
                run_state: run_state.clone(),
                query_engine: query.clone(),
                write_engine: write.clone(),
                meta: meta.clone(),
                http_stats: http.clone(),
                transport: transport.clone(),
            },
        );
        Self {
            shell,
            transport,
            query,
            write,
            meta,
            http,
            run_state,
        }
    }

    /// Builds an inbound message from `CONN`.
    pub(crate) fn message(kind: MsgKind, payload: Vec<u8>) -> InboundMessage {
        InboundMessage::new(kind.as_wire(), payload, CONN)
    }

    /// Runs a query through the shell and returns the issued wire handle,
    /// discarding the query response.
    pub(crate) fn issue_handle(&self, engine: EngineHandle) -> QueryHandle {
        *self.query.submit_handle.lock().unwrap() = Some(engine);
        self.shell
            .handle_message(Self::message(MsgKind::Query, vec![1]));
        let response = self.transport.only_response();
        self.transport.take_sent();
        let rsp = QueryRsp::decode(&response.payload).expect("query response decodes");
        assert!(!rsp.handle.is_null(), "expected an issued handle");
        rsp.handle
    }
}

#[fixture]
pub(crate) fn harness() -> Harness {
    Harness::with_config(&ShellConfig::default())
}

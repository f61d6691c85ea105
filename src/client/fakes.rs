//! In-memory browser used by the client tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::client::ClientError;
use crate::client::permission::{PermissionDecision, PermissionState};
use crate::ports::browser::{
    AgentHost, ChatEventSource, ClickTarget, ClientWindow, KeyValueStore, ListenerKey,
    LocalNotification, MessageListener, Page, PermissionPrompt, PushManager, RelayApi,
};
use crate::types::chat::ChatMessageEvent;
use crate::types::push::{NotificationPayload, PushRequest, Subscription};

#[derive(Clone)]
pub(crate) struct FakePrompt {
    pub(crate) supported: bool,
    pub(crate) state: Rc<Cell<PermissionState>>,
    pub(crate) decision: PermissionDecision,
    pub(crate) requests: Rc<Cell<u32>>,
}

impl FakePrompt {
    pub(crate) fn new(state: PermissionState, decision: PermissionDecision) -> Self {
        Self {
            supported: state != PermissionState::Unsupported,
            state: Rc::new(Cell::new(state)),
            decision,
            requests: Rc::new(Cell::new(0)),
        }
    }
}

impl PermissionPrompt for FakePrompt {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn current(&self) -> PermissionState {
        self.state.get()
    }

    async fn request(&self) -> PermissionDecision {
        self.requests.set(self.requests.get() + 1);
        self.state.set(self.state.get().after_request(self.decision));
        self.decision
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakePushManager {
    pub(crate) agents: Rc<RefCell<Vec<String>>>,
    pub(crate) active: Rc<RefCell<Option<Subscription>>>,
    pub(crate) server_keys: Rc<RefCell<Vec<String>>>,
}

impl PushManager for FakePushManager {
    async fn register_agent(&self, script_url: &str) -> Result<(), ClientError> {
        self.agents.borrow_mut().push(script_url.to_string());
        Ok(())
    }

    async fn subscribe(&self, application_server_key: &str) -> Result<Subscription, ClientError> {
        self.server_keys
            .borrow_mut()
            .push(application_server_key.to_string());
        let subscription = Subscription::new("https://push.example/browser", "p256", "auth");
        *self.active.borrow_mut() = Some(subscription.clone());
        Ok(subscription)
    }

    async fn unsubscribe(&self) -> Result<bool, ClientError> {
        Ok(self.active.borrow_mut().take().is_some())
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStorage {
    pub(crate) items: Rc<RefCell<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RelayCall {
    Register(String, Subscription),
    Deregister(String),
    SendPush(Subscription, PushRequest),
}

#[derive(Clone, Default)]
pub(crate) struct FakeRelay {
    pub(crate) calls: Rc<RefCell<Vec<RelayCall>>>,
    pub(crate) offline: bool,
}

impl FakeRelay {
    pub(crate) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    fn record(&self, call: RelayCall) -> Result<(), ClientError> {
        self.calls.borrow_mut().push(call);
        if self.offline {
            Err(ClientError::Browser("network unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RelayApi for FakeRelay {
    async fn register(&self, user_id: &str, subscription: &Subscription) -> Result<(), ClientError> {
        self.record(RelayCall::Register(user_id.to_string(), subscription.clone()))
    }

    async fn deregister(&self, user_id: &str) -> Result<(), ClientError> {
        self.record(RelayCall::Deregister(user_id.to_string()))
    }

    async fn send_push(
        &self,
        subscription: &Subscription,
        request: &PushRequest,
    ) -> Result<(), ClientError> {
        self.record(RelayCall::SendPush(subscription.clone(), request.clone()))
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakePage {
    pub(crate) focused: Rc<Cell<bool>>,
    pub(crate) denied: Rc<Cell<bool>>,
    pub(crate) focus_calls: Rc<Cell<u32>>,
    pub(crate) shown: Rc<RefCell<Vec<LocalNotification>>>,
}

impl Page for FakePage {
    fn has_focus(&self) -> bool {
        self.focused.get()
    }

    fn notification_permission(&self) -> PermissionState {
        if self.denied.get() {
            PermissionState::Denied
        } else {
            PermissionState::Granted
        }
    }

    fn focus_window(&self) {
        self.focus_calls.set(self.focus_calls.get() + 1);
    }

    fn show_notification(&self, notification: LocalNotification) {
        self.shown.borrow_mut().push(notification);
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeSource {
    pub(crate) listeners: Rc<RefCell<BTreeMap<u64, MessageListener>>>,
    next_key: Rc<Cell<u64>>,
}

impl FakeSource {
    pub(crate) fn emit(&self, event: ChatMessageEvent) {
        for listener in self.listeners.borrow().values() {
            listener(event.clone());
        }
    }
}

impl ChatEventSource for FakeSource {
    fn on_message_new(&self, listener: MessageListener) -> ListenerKey {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.listeners.borrow_mut().insert(key, listener);
        ListenerKey(key)
    }

    fn off_message_new(&self, key: ListenerKey) {
        self.listeners.borrow_mut().remove(&key.0);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HostCall {
    Show(NotificationPayload),
    Close(String),
    Focus(String),
    Open(String),
    SkipWaiting,
    Claim,
}

#[derive(Clone)]
pub(crate) struct FakeHost {
    pub(crate) origin: String,
    pub(crate) windows: Vec<ClientWindow>,
    pub(crate) calls: Rc<RefCell<Vec<HostCall>>>,
}

impl FakeHost {
    pub(crate) fn new(windows: Vec<ClientWindow>) -> Self {
        Self {
            origin: "https://chat.example".to_string(),
            windows,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub(crate) fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }
}

impl AgentHost for FakeHost {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn show_notification(&self, payload: &NotificationPayload) -> Result<(), ClientError> {
        self.calls.borrow_mut().push(HostCall::Show(payload.clone()));
        Ok(())
    }

    fn close_notification(&self, tag: &str) {
        self.calls.borrow_mut().push(HostCall::Close(tag.to_string()));
    }

    async fn match_windows(&self) -> Vec<ClientWindow> {
        self.windows.clone()
    }

    async fn focus(&self, window: &ClientWindow) -> Result<(), ClientError> {
        self.calls.borrow_mut().push(HostCall::Focus(window.id.clone()));
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), ClientError> {
        self.calls.borrow_mut().push(HostCall::Open(url.to_string()));
        Ok(())
    }

    fn skip_waiting(&self) {
        self.calls.borrow_mut().push(HostCall::SkipWaiting);
    }

    async fn claim_clients(&self) -> Result<(), ClientError> {
        self.calls.borrow_mut().push(HostCall::Claim);
        Ok(())
    }
}

pub(crate) fn click_target() -> ClickTarget {
    ClickTarget {
        channel_id: "team".to_string(),
        message_id: "m1".to_string(),
    }
}

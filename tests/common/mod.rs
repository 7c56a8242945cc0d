//! Common test utilities for reconciler and Pact tests
//!
//! Provides an in-memory object store with resourceVersion checks, recording
//! provider backends, resource fixtures, and rustls setup for tests that
//! talk HTTP.

#![allow(dead_code, reason = "each test binary uses a different subset of helpers")]

use async_trait::async_trait;
use hermes_mail_controller::config::ControllerConfig;
use hermes_mail_controller::controller::reconciler::Reconciler;
use hermes_mail_controller::crd::{
    Email, EmailSenderConfig, EmailSenderConfigSpec, EmailSenderConfigStatus, EmailSpec,
    EmailStatus,
};
use hermes_mail_controller::provider::{
    EmailProvider, MessageDescriptor, ProviderError, ProviderKind, ProviderRegistry,
};
use hermes_mail_controller::store::{ObjectStore, StoreError};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

pub const NAMESPACE: &str = "default";

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

fn bump(meta: &mut ObjectMeta) {
    let next = meta
        .resource_version
        .as_deref()
        .and_then(|rv| rv.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    meta.resource_version = Some(next.to_string());
}

/// Object store backed by hash maps
///
/// Status writes are compare-and-swap on `resourceVersion`, like the API
/// server: writing with a stale object fails with `StoreError::Conflict`.
#[derive(Default)]
pub struct InMemoryStore {
    sender_configs: Mutex<HashMap<Key, EmailSenderConfig>>,
    emails: Mutex<HashMap<Key, Email>>,
    secrets: Mutex<HashMap<Key, Secret>>,
    email_status_writes: AtomicUsize,
    sender_config_status_writes: AtomicUsize,
    secrets_unreachable: AtomicBool,
    forced_email_conflicts: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_sender_config(&self, mut config: EmailSenderConfig) -> EmailSenderConfig {
        bump(&mut config.metadata);
        let k = key(
            config.metadata.namespace.as_deref().unwrap_or(NAMESPACE),
            config.metadata.name.as_deref().unwrap_or_default(),
        );
        self.sender_configs
            .lock()
            .unwrap()
            .insert(k, config.clone());
        config
    }

    pub fn put_email(&self, mut email: Email) -> Email {
        bump(&mut email.metadata);
        let k = key(
            email.metadata.namespace.as_deref().unwrap_or(NAMESPACE),
            email.metadata.name.as_deref().unwrap_or_default(),
        );
        self.emails.lock().unwrap().insert(k, email.clone());
        email
    }

    pub fn put_secret(&self, secret: Secret) {
        let k = key(
            secret.metadata.namespace.as_deref().unwrap_or(NAMESPACE),
            secret.metadata.name.as_deref().unwrap_or_default(),
        );
        self.secrets.lock().unwrap().insert(k, secret);
    }

    pub fn email(&self, name: &str) -> Email {
        self.emails.lock().unwrap()[&key(NAMESPACE, name)].clone()
    }

    pub fn sender_config(&self, name: &str) -> EmailSenderConfig {
        self.sender_configs.lock().unwrap()[&key(NAMESPACE, name)].clone()
    }

    pub fn email_status_writes(&self) -> usize {
        self.email_status_writes.load(Ordering::SeqCst)
    }

    pub fn sender_config_status_writes(&self) -> usize {
        self.sender_config_status_writes.load(Ordering::SeqCst)
    }

    /// Bump an Email's resourceVersion without touching its status, like a
    /// label edit made by someone else
    pub fn touch_email(&self, name: &str) {
        let mut emails = self.emails.lock().unwrap();
        if let Some(stored) = emails.get_mut(&key(NAMESPACE, name)) {
            bump(&mut stored.metadata);
        }
    }

    /// Make the next `count` Email status writes lose a race with another
    /// writer that only changes metadata
    pub fn force_email_conflicts(&self, count: usize) {
        self.forced_email_conflicts.store(count, Ordering::SeqCst);
    }

    /// Make every Secret read fail as if the API server were down
    pub fn make_secrets_unreachable(&self) {
        self.secrets_unreachable.store(true, Ordering::SeqCst);
    }
}

fn conflict(kind: &'static str, namespace: &str, name: &str) -> StoreError {
    StoreError::Conflict {
        kind,
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

fn not_found(kind: &'static str, namespace: &str, name: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get_email(&self, namespace: &str, name: &str) -> Result<Email, StoreError> {
        self.emails
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found("Email", namespace, name))
    }

    async fn get_sender_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<EmailSenderConfig, StoreError> {
        self.sender_configs
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found("EmailSenderConfig", namespace, name))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        if self.secrets_unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection refused".into()));
        }
        self.secrets
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found("Secret", namespace, name))
    }

    async fn update_email_status(
        &self,
        email: &Email,
        status: &EmailStatus,
    ) -> Result<(), StoreError> {
        let namespace = email.metadata.namespace.as_deref().unwrap_or(NAMESPACE);
        let name = email.metadata.name.as_deref().unwrap_or_default();
        let mut emails = self.emails.lock().unwrap();
        let stored = emails
            .get_mut(&key(namespace, name))
            .ok_or_else(|| not_found("Email", namespace, name))?;
        let forced = self
            .forced_email_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            bump(&mut stored.metadata);
        }
        if stored.metadata.resource_version != email.metadata.resource_version {
            return Err(conflict("Email", namespace, name));
        }
        stored.status = Some(status.clone());
        bump(&mut stored.metadata);
        self.email_status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_sender_config_status(
        &self,
        config: &EmailSenderConfig,
        status: &EmailSenderConfigStatus,
    ) -> Result<(), StoreError> {
        let namespace = config.metadata.namespace.as_deref().unwrap_or(NAMESPACE);
        let name = config.metadata.name.as_deref().unwrap_or_default();
        let mut configs = self.sender_configs.lock().unwrap();
        let stored = configs
            .get_mut(&key(namespace, name))
            .ok_or_else(|| not_found("EmailSenderConfig", namespace, name))?;
        if stored.metadata.resource_version != config.metadata.resource_version {
            return Err(conflict("EmailSenderConfig", namespace, name));
        }
        stored.status = Some(status.clone());
        bump(&mut stored.metadata);
        self.sender_config_status_writes
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A provider call as observed by [`RecordingProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub token: String,
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: String,
}

/// Provider backend that records every call
///
/// Accepts any message carrying a token and answers with `message_id`;
/// rejects an empty token with 401 like the real APIs do.
pub struct RecordingProvider {
    kind: ProviderKind,
    message_id: String,
    calls: Mutex<Vec<SentMessage>>,
}

impl RecordingProvider {
    pub fn new(kind: ProviderKind, message_id: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            message_id: message_id.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<SentMessage> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailProvider for RecordingProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn send(&self, message: &MessageDescriptor) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(SentMessage {
            token: message.token.expose().to_string(),
            subject: message.subject.clone(),
            body: message.body.clone(),
            from: message.from.clone(),
            to: message.to.clone(),
        });
        if message.token.is_empty() {
            return Err(ProviderError::Rejected {
                provider: self.kind,
                status: 401,
                message: "Unauthenticated.".to_string(),
            });
        }
        Ok(self.message_id.clone())
    }
}

/// Store, recording backends and the reconciler context wired together
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub mailersend: Arc<RecordingProvider>,
    pub mailgun: Arc<RecordingProvider>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let mailersend = RecordingProvider::new(ProviderKind::MailerSend, "ms-0001");
        let mailgun = RecordingProvider::new(
            ProviderKind::Mailgun,
            "<20240101000000.1.ABCDEF@mg.example.com>",
        );
        let providers = ProviderRegistry::new(
            Arc::clone(&mailersend) as Arc<dyn EmailProvider>,
            Arc::clone(&mailgun) as Arc<dyn EmailProvider>,
        );
        let reconciler = Reconciler::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            providers,
            ControllerConfig::default(),
        );
        Self {
            store,
            mailersend,
            mailgun,
            reconciler,
        }
    }

    pub fn total_provider_calls(&self) -> usize {
        self.mailersend.call_count() + self.mailgun.call_count()
    }
}

pub fn sender_config(
    name: &str,
    provider: &str,
    sender: &str,
    credential: &str,
) -> EmailSenderConfig {
    let mut config = EmailSenderConfig::new(
        name,
        EmailSenderConfigSpec {
            provider: provider.to_string(),
            sender_address: sender.to_string(),
            credential_ref: credential.to_string(),
        },
    );
    config.metadata.namespace = Some(NAMESPACE.to_string());
    config.metadata.generation = Some(1);
    config
}

pub fn email(name: &str, sender_config: &str) -> Email {
    let mut email = Email::new(
        name,
        EmailSpec {
            subject: "hi".to_string(),
            body: "there".to_string(),
            recipient_address: "b@example.com".to_string(),
            sender_config_ref: sender_config.to_string(),
        },
    );
    email.metadata.namespace = Some(NAMESPACE.to_string());
    email.metadata.generation = Some(1);
    email
}

/// Secret holding `data` as its binary data
pub fn secret(name: &str, data: &[(&str, &str)]) -> Secret {
    let data: BTreeMap<String, ByteString> = data
        .iter()
        .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
        .collect();
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..ObjectMeta::default()
        },
        data: Some(data),
        ..Secret::default()
    }
}

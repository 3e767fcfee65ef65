// messaging-core/src/runtime/memory_store.rs
// ============================================================================
// Module: In-Memory Store
// Description: Simple in-memory Store implementation for tests and demos.
// Purpose: Provide a deterministic store without external dependencies.
// Dependencies: crate::{core, interfaces, runtime::segment_evaluator}
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`Store`] for unit
//! tests and the `system-tests` end-to-end scenarios. It is not intended
//! for production use; `messaging-store-sqlite` is the durable
//! implementation. Recipient matching always falls back to full in-memory
//! filtering via [`crate::runtime::segment_evaluator::evaluate`] since
//! there is no query engine to push predicates into.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::core::AttributeBag;
use crate::core::Campaign;
use crate::core::CampaignId;
use crate::core::ConsentState;
use crate::core::DeliveryReceipt;
use crate::core::E164;
use crate::core::Message;
use crate::core::MessageId;
use crate::core::MessageStatus;
use crate::core::RuleNode;
use crate::core::Segment;
use crate::core::SegmentId;
use crate::core::Template;
use crate::core::TemplateId;
use crate::core::Timestamp;
use crate::core::events::AuditRecord;
use crate::core::events::AuditSubject;
use crate::core::events::InboundEvent;
use crate::core::merge_attributes;
use crate::interfaces::Cursor;
use crate::interfaces::MessageTransitionFields;
use crate::interfaces::RecipientPage;
use crate::interfaces::Store;
use crate::interfaces::StoreError;
use crate::runtime::segment_evaluator::evaluate;

/// Raw recipient storage plus consent bookkeeping.
#[derive(Debug, Clone)]
struct RecipientRow {
    /// Open attribute bag.
    attributes: AttributeBag,
    /// Current consent state.
    consent_state: ConsentState,
    /// Creation timestamp.
    created_at: Timestamp,
    /// Last-update timestamp.
    updated_at: Timestamp,
}

/// All mutable state, guarded by a single mutex. The in-memory store
/// favors simplicity over fine-grained locking.
#[derive(Default)]
struct Inner {
    /// Recipients keyed by E.164.
    recipients: BTreeMap<String, RecipientRow>,
    /// Messages keyed by id.
    messages: BTreeMap<String, Message>,
    /// Message id keyed by provider sid, for callback correlation.
    by_provider_sid: BTreeMap<String, String>,
    /// Raw inbound events.
    inbound: Vec<InboundEvent>,
    /// Raw delivery receipts.
    receipts: Vec<DeliveryReceipt>,
    /// Append-only audit trail.
    audit: Vec<AuditRecord>,
    /// Campaigns keyed by id.
    campaigns: BTreeMap<String, Campaign>,
    /// Templates keyed by id.
    templates: BTreeMap<String, Template>,
    /// Segments keyed by id.
    segments: BTreeMap<String, Segment>,
    /// Monotonic counter for id assignment.
    next_id: u64,
}

impl Inner {
    /// Allocates a fresh opaque id with the given prefix.
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// In-memory [`Store`] for tests and local demos.
#[derive(Default)]
pub struct InMemoryStore {
    /// All state, behind one mutex.
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/demo helper: seeds a template directly, bypassing any API.
    pub fn seed_template(&self, template: Template) {
        let mut guard = self.lock();
        guard.templates.insert(template.id.as_str().to_string(), template);
    }

    /// Test/demo helper: seeds a segment directly, bypassing any API.
    pub fn seed_segment(&self, segment: Segment) {
        let mut guard = self.lock();
        guard.segments.insert(segment.id.as_str().to_string(), segment);
    }

    /// Locks the inner state, recovering from poisoning rather than
    /// propagating a panic across an unrelated caller.
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Store for InMemoryStore {
    fn get_recipient(&self, e164: &E164) -> Result<Option<crate::core::Recipient>, StoreError> {
        let guard = self.lock();
        Ok(guard.recipients.get(e164.as_str()).map(|row| crate::core::Recipient {
            e164: e164.clone(),
            attributes: row.attributes.clone(),
            consent_state: row.consent_state,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    fn upsert_recipient(&self, e164: &E164, attrs: AttributeBag, at: Timestamp) -> Result<(), StoreError> {
        let mut guard = self.lock();
        match guard.recipients.get_mut(e164.as_str()) {
            Some(row) => {
                merge_attributes(&mut row.attributes, attrs);
                row.updated_at = at;
            }
            None => {
                guard.recipients.insert(
                    e164.as_str().to_string(),
                    RecipientRow {
                        attributes: attrs,
                        consent_state: ConsentState::OptIn,
                        created_at: at,
                        updated_at: at,
                    },
                );
            }
        }
        Ok(())
    }

    fn update_consent(
        &self,
        e164: &E164,
        new_state: ConsentState,
        _source: &str,
        at: Timestamp,
    ) -> Result<ConsentState, StoreError> {
        let mut guard = self.lock();
        let row = guard
            .recipients
            .get_mut(e164.as_str())
            .ok_or_else(|| StoreError::NotFound(format!("recipient {e164}")))?;
        let prior = row.consent_state;
        row.consent_state = new_state;
        row.updated_at = at;
        Ok(prior)
    }

    fn insert_raw_inbound(&self, event: InboundEvent) -> Result<String, StoreError> {
        let mut guard = self.lock();
        let id = guard.fresh_id("inbound");
        let mut event = event;
        event.id = id.clone();
        guard.inbound.push(event);
        Ok(id)
    }

    fn insert_raw_receipt(&self, receipt: DeliveryReceipt) -> Result<String, StoreError> {
        let mut guard = self.lock();
        let id = guard.fresh_id("receipt");
        let mut receipt = receipt;
        receipt.id = id.clone();
        guard.receipts.push(receipt);
        Ok(id)
    }

    fn create_message(
        &self,
        campaign_id: &CampaignId,
        e164: &E164,
        rendered: &str,
        at: Timestamp,
    ) -> Result<MessageId, StoreError> {
        let mut guard = self.lock();
        let id = MessageId::new(guard.fresh_id("msg"));
        let message = Message {
            id: id.clone(),
            campaign_id: campaign_id.clone(),
            recipient: e164.clone(),
            rendered_content: rendered.to_string(),
            status: MessageStatus::Queued,
            provider_sid: None,
            error_code: None,
            retry_count: 0,
            created_at: at,
            sent_at: None,
            delivered_at: None,
        };
        guard.messages.insert(id.as_str().to_string(), message);
        Ok(id)
    }

    fn transition_message(
        &self,
        id: &MessageId,
        from: MessageStatus,
        to: MessageStatus,
        fields: MessageTransitionFields,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let message = guard
            .messages
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(format!("message {id}")))?;
        if message.status != from {
            return Err(StoreError::TransitionConflict(id.clone()));
        }
        message.status = to;
        if let Some(sid) = fields.provider_sid.clone() {
            message.provider_sid = Some(sid);
        }
        if let Some(code) = fields.error_code {
            message.error_code = Some(code);
        }
        if fields.increment_retry {
            message.retry_count += 1;
        }
        if to == MessageStatus::Sent {
            message.sent_at.get_or_insert(fields.at);
        }
        if to == MessageStatus::Delivered {
            message.delivered_at.get_or_insert(fields.at);
        }
        if let Some(sid) = fields.provider_sid {
            guard.by_provider_sid.insert(sid, id.as_str().to_string());
        }
        Ok(())
    }

    fn get_message(&self, id: &MessageId) -> Result<Option<Message>, StoreError> {
        Ok(self.lock().messages.get(id.as_str()).cloned())
    }

    fn find_message_by_provider_sid(&self, sid: &str) -> Result<Option<Message>, StoreError> {
        let guard = self.lock();
        Ok(guard
            .by_provider_sid
            .get(sid)
            .and_then(|id| guard.messages.get(id))
            .cloned())
    }

    fn list_non_terminal_messages(&self, campaign_id: &CampaignId) -> Result<Vec<MessageId>, StoreError> {
        let guard = self.lock();
        Ok(guard
            .messages
            .values()
            .filter(|m| &m.campaign_id == campaign_id && !m.status.is_terminal())
            .map(|m| m.id.clone())
            .collect())
    }

    fn list_recipients_matching(
        &self,
        rule: &RuleNode,
        cursor: Cursor,
        limit: usize,
    ) -> Result<RecipientPage, StoreError> {
        let guard = self.lock();
        let resume_after = cursor.0;
        let mut matched: Vec<E164> = Vec::new();
        for (e164_str, row) in &guard.recipients {
            if let Some(after) = &resume_after {
                if e164_str.as_str() <= after.as_str() {
                    continue;
                }
            }
            let mut attrs = row.attributes.clone();
            attrs.insert(
                crate::core::CONSENT_STATE_ATTRIBUTE.to_string(),
                serde_json::Value::String(row.consent_state.to_string()),
            );
            if evaluate(rule, &attrs) {
                // Safety-checked E.164 round trip: recipients are only ever
                // inserted through upsert_recipient's validated key.
                if let Ok(e164) = E164::parse(e164_str) {
                    matched.push(e164);
                }
            }
            if matched.len() >= limit {
                break;
            }
        }
        let next_cursor = match matched.last() {
            Some(last) if matched.len() >= limit => Cursor(Some(last.as_str().to_string())),
            _ => Cursor(None),
        };
        Ok(RecipientPage {
            recipients: matched,
            next_cursor,
        })
    }

    fn append_audit(&self, record: AuditRecord) -> Result<(), StoreError> {
        self.lock().audit.push(record);
        Ok(())
    }

    fn list_audit(&self, subject: &AuditSubject) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self
            .lock()
            .audit
            .iter()
            .filter(|r| &r.subject == subject)
            .cloned()
            .collect())
    }

    fn get_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, StoreError> {
        Ok(self.lock().campaigns.get(id.as_str()).cloned())
    }

    fn upsert_campaign(&self, campaign: &Campaign) -> Result<(), StoreError> {
        self.lock().campaigns.insert(campaign.id.as_str().to_string(), campaign.clone());
        Ok(())
    }

    fn save_materialization_progress(
        &self,
        id: &CampaignId,
        cursor: Cursor,
        complete: bool,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let campaign = guard
            .campaigns
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(format!("campaign {id}")))?;
        campaign.materialization_cursor = cursor.0;
        campaign.materialization_complete = complete;
        Ok(())
    }

    fn get_template(&self, id: &TemplateId) -> Result<Option<Template>, StoreError> {
        Ok(self.lock().templates.get(id.as_str()).cloned())
    }

    fn get_segment(&self, id: &SegmentId) -> Result<Option<Segment>, StoreError> {
        Ok(self.lock().segments.get(id.as_str()).cloned())
    }
}

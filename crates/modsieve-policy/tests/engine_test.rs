//! End-to-end engine tests
//!
//! Build an engine from descriptors, run events through it against a
//! recording gateway, and assert on the consolidated outcome.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use modsieve_core::{
    Author, Channel, Embed, EventContext, EventKind, GatewayError, InfractionKind,
    InfractionRequest, MentionCache, ModerationGateway, SourceMessage,
};
use modsieve_policy::{FilterDescriptor, FilterEngine, FilterListDescriptor, ListKind};

/// A gateway that records every outbound call instead of talking to a
/// platform. Failure modes are configurable per capability.
#[derive(Default)]
struct RecordingGateway {
    dm_forbidden: bool,
    delete_not_found: bool,
    deletes: Mutex<Vec<u64>>,
    dms: Mutex<Vec<(u64, String)>>,
    channel_messages: Mutex<Vec<(u64, String)>>,
    infractions: Mutex<Vec<InfractionRequest>>,
    mentions: MentionCache,
}

impl RecordingGateway {
    fn new() -> Self {
        Self::default()
    }

    fn with_dm_forbidden(mut self) -> Self {
        self.dm_forbidden = true;
        self
    }

    fn with_delete_not_found(mut self) -> Self {
        self.delete_not_found = true;
        self
    }
}

#[async_trait]
impl ModerationGateway for RecordingGateway {
    async fn send_dm(&self, user_id: u64, text: &str, _embed: &Embed) -> Result<(), GatewayError> {
        if self.dm_forbidden {
            return Err(GatewayError::Forbidden);
        }
        self.dms.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }

    async fn send_channel_message(
        &self,
        channel_id: u64,
        text: &str,
        _embed: &Embed,
    ) -> Result<(), GatewayError> {
        self.channel_messages
            .lock()
            .unwrap()
            .push((channel_id, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, message: &SourceMessage) -> Result<(), GatewayError> {
        if self.delete_not_found {
            return Err(GatewayError::NotFound);
        }
        self.deletes.lock().unwrap().push(message.id);
        Ok(())
    }

    async fn issue_infraction(&self, request: &InfractionRequest) -> Result<(), GatewayError> {
        self.infractions.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn resolve_mention(&self, id: u64) -> String {
        // Treat every id as a role, as a guild with only role pings would.
        self.mentions.resolve(id, |id| format!("<@&{id}>"))
    }
}

fn settings_map(value: Value) -> Map<String, Value> {
    value.as_object().expect("object literal").clone()
}

fn tokens_list(filters: Vec<FilterDescriptor>, defaults: Value) -> FilterListDescriptor {
    FilterListDescriptor {
        name: "tokens".to_string(),
        description: "Deny-listed tokens".to_string(),
        list_type: ListKind::Deny,
        filters,
        settings: settings_map(defaults),
    }
}

fn filter(id: u64, content: &str, settings: Value) -> FilterDescriptor {
    FilterDescriptor {
        id,
        content: content.to_string(),
        description: String::new(),
        additional_field: false,
        settings: settings_map(settings),
    }
}

fn guild_message_ctx(content: &str) -> EventContext {
    EventContext::new(
        EventKind::MessageCreate,
        Author {
            id: 1000,
            mention: "<@1000>".to_string(),
            roles: vec![],
        },
        Channel {
            id: 200,
            guild_id: Some(300),
            category_id: None,
        },
        content,
        Some(SourceMessage {
            id: 400,
            channel_id: 200,
            guild_id: Some(300),
        }),
        vec![],
    )
}

fn infraction_settings(kind: &str, duration: f64, dm_content: &str) -> Value {
    json!({
        "enabled": true,
        "infraction_and_notification": {
            "infraction_type": kind,
            "infraction_reason": format!("{kind} reason"),
            "infraction_duration": duration,
            "dm_content": dm_content,
            "dm_embed": "",
        },
    })
}

#[tokio::test]
async fn scenario_delete_and_ping_applied_once() {
    let mut engine = FilterEngine::new();
    engine
        .add_list(&tokens_list(
            vec![filter(1, "bad-word", json!({}))],
            json!({
                "enabled": true,
                "delete_messages": true,
                "mentions": {"ping_type": [111], "dm_ping_type": []},
            }),
        ))
        .unwrap();

    let gateway = RecordingGateway::new();
    let mut ctx = guild_message_ctx("this message has a bad-word in it");
    let triggered = engine.handle_event(&mut ctx, &gateway).await.unwrap();

    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].filter_id, 1);
    assert_eq!(triggered[0].token, "bad-word");

    assert_eq!(*gateway.deletes.lock().unwrap(), vec![400]);
    assert!(ctx.alert_content.starts_with("<@&111> "));
}

#[tokio::test]
async fn scenario_two_mutes_aggregate_to_max_duration() {
    let mut engine = FilterEngine::new();
    engine
        .add_list(&tokens_list(
            vec![
                filter(1, "bad-word", infraction_settings("mute", 3600.0, "")),
                filter(2, "worse-word", infraction_settings("mute", 7200.0, "")),
            ],
            json!({"enabled": true}),
        ))
        .unwrap();

    let gateway = RecordingGateway::new();
    let mut ctx = guild_message_ctx("a bad-word and a worse-word together");
    let triggered = engine.handle_event(&mut ctx, &gateway).await.unwrap();
    assert_eq!(triggered.len(), 2);

    let infractions = gateway.infractions.lock().unwrap();
    assert_eq!(infractions.len(), 1, "one aggregated infraction");
    assert_eq!(infractions[0].kind, InfractionKind::Mute);
    assert_eq!(infractions[0].duration_secs, 7200.0);
}

#[tokio::test]
async fn scenario_ban_beats_warning_keeping_ban_duration() {
    let mut engine = FilterEngine::new();
    engine
        .add_list(&tokens_list(
            vec![
                filter(1, "bad-word", infraction_settings("ban", 60.0, "")),
                filter(2, "worse-word", infraction_settings("warning", 999_999.0, "")),
            ],
            json!({"enabled": true}),
        ))
        .unwrap();

    let gateway = RecordingGateway::new();
    let mut ctx = guild_message_ctx("a bad-word and a worse-word together");
    engine.handle_event(&mut ctx, &gateway).await.unwrap();

    let infractions = gateway.infractions.lock().unwrap();
    assert_eq!(infractions.len(), 1);
    assert_eq!(infractions[0].kind, InfractionKind::Ban);
    // The warning's duration is discarded, not maximized.
    assert_eq!(infractions[0].duration_secs, 60.0);
    // Bans are announced in the moderation-alerts channel.
    assert!(infractions[0].alert_channel_fallback);
}

#[tokio::test]
async fn scenario_forbidden_dm_falls_back_to_channel_once() {
    let mut engine = FilterEngine::new();
    engine
        .add_list(&tokens_list(
            vec![filter(
                1,
                "bad-word",
                infraction_settings("mute", 3600.0, "Please don't."),
            )],
            json!({"enabled": true}),
        ))
        .unwrap();

    let gateway = RecordingGateway::new().with_dm_forbidden();
    let mut ctx = guild_message_ctx("a bad-word appears");
    engine.handle_event(&mut ctx, &gateway).await.unwrap();

    assert!(gateway.dms.lock().unwrap().is_empty());
    let posts = gateway.channel_messages.lock().unwrap();
    assert_eq!(posts.len(), 1, "exactly one fallback post");
    assert_eq!(posts[0].0, 200);
    assert_eq!(posts[0].1, "Please don't.");

    // The mute still goes out despite the forbidden DM.
    assert_eq!(gateway.infractions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn already_deleted_message_is_not_an_error() {
    let mut engine = FilterEngine::new();
    engine
        .add_list(&tokens_list(
            vec![filter(1, "bad-word", json!({}))],
            json!({"enabled": true, "delete_messages": true}),
        ))
        .unwrap();

    let gateway = RecordingGateway::new().with_delete_not_found();
    let mut ctx = guild_message_ctx("a bad-word appears");
    let triggered = engine.handle_event(&mut ctx, &gateway).await.unwrap();

    assert_eq!(triggered.len(), 1);
    assert!(gateway.deletes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn default_failure_requires_an_override_to_fire() {
    let mut engine = FilterEngine::new();
    engine
        .add_list(&tokens_list(
            vec![
                filter(1, "bad-word", json!({})),
                filter(
                    2,
                    "bad-word",
                    json!({"filter_dm": true, "enabled": true}),
                ),
            ],
            json!({"filter_dm": false}),
        ))
        .unwrap();

    // A DM event: the list-wide filter_dm=false fails by default.
    let gateway = RecordingGateway::new();
    let mut ctx = EventContext::new(
        EventKind::MessageCreate,
        Author {
            id: 1000,
            mention: "<@1000>".to_string(),
            roles: vec![],
        },
        Channel {
            id: 200,
            guild_id: None,
            category_id: None,
        },
        "a bad-word in a DM",
        None,
        vec![],
    );
    let triggered = engine.handle_event(&mut ctx, &gateway).await.unwrap();

    // Filter 1 has no override and stays silent; filter 2 overrides the
    // failing default and passes one extra name, so it fires.
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].filter_id, 2);
}

#[tokio::test]
async fn superstar_rides_alongside_the_primary_infraction() {
    let mut engine = FilterEngine::new();
    engine
        .add_list(&tokens_list(
            vec![
                filter(1, "bad-word", infraction_settings("superstar", 500.0, "")),
                filter(2, "worse-word", infraction_settings("mute", 3600.0, "")),
            ],
            json!({"enabled": true}),
        ))
        .unwrap();

    let gateway = RecordingGateway::new();
    let mut ctx = guild_message_ctx("a bad-word and a worse-word together");
    engine.handle_event(&mut ctx, &gateway).await.unwrap();

    let infractions = gateway.infractions.lock().unwrap();
    assert_eq!(infractions.len(), 2);
    assert_eq!(infractions[0].kind, InfractionKind::Superstar);
    assert_eq!(infractions[0].duration_secs, 500.0);
    assert_eq!(infractions[1].kind, InfractionKind::Mute);
    assert_eq!(infractions[1].duration_secs, 3600.0);
}

#[tokio::test]
async fn edit_events_are_dispatched_too() {
    let mut engine = FilterEngine::new();
    engine
        .add_list(&tokens_list(
            vec![filter(1, "bad-word", json!({}))],
            json!({"enabled": true}),
        ))
        .unwrap();

    let gateway = RecordingGateway::new();
    let mut ctx = guild_message_ctx("now with a bad-word");
    ctx.event = EventKind::MessageEdit;
    let triggered = engine.handle_event(&mut ctx, &gateway).await.unwrap();
    assert_eq!(triggered.len(), 1);
}

#[tokio::test]
async fn reload_swaps_the_whole_snapshot() {
    let handle = modsieve_policy::EngineHandle::default();
    handle
        .reload(&[tokens_list(
            vec![filter(1, "bad-word", json!({}))],
            json!({"enabled": true}),
        )])
        .await
        .unwrap();

    let gateway = RecordingGateway::new();
    let mut ctx = guild_message_ctx("a bad-word appears");
    assert_eq!(handle.handle_event(&mut ctx, &gateway).await.unwrap().len(), 1);

    // Reload with the filter gone; the same event no longer triggers.
    handle
        .reload(&[tokens_list(vec![], json!({"enabled": true}))])
        .await
        .unwrap();
    let mut ctx = guild_message_ctx("a bad-word appears");
    assert!(handle.handle_event(&mut ctx, &gateway).await.unwrap().is_empty());
}

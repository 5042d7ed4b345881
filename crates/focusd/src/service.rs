//! Main service state and event loop

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use focus_api::{
    BlockCategory, CategoryView, Command, ErrorInfo, Event, EventPayload, Response,
    ResponsePayload, SessionInfo,
};
use focus_config::Settings;
use focus_core::{
    ControllerEvents, ControllerOptions, CoreEvent, EnforcementEvent, SessionController,
};
use focus_host_api::{HostEvent, OsCapability};
use focus_ipc::{IpcServer, ServerMessage};
use focus_store::{AuditEvent, AuditEventType, Store};
use focus_util::{ClientId, FocusError};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// The running daemon: one controller, one IPC server, one host.
pub struct Service {
    dispatcher: Dispatcher,
    events: ControllerEvents,
    host: Arc<dyn OsCapability>,
    session_tick: Duration,
}

/// Owns the controller and answers everything the event loop hands it
struct Dispatcher {
    controller: SessionController,
    ipc: Arc<IpcServer>,
    store: Arc<dyn Store>,
}

impl Service {
    /// Build the controller, pick up a persisted session and bind the socket.
    pub async fn new(
        settings: &Settings,
        host: Arc<dyn OsCapability>,
        store: Arc<dyn Store>,
    ) -> Result<Self> {
        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;

        let (mut controller, events) = SessionController::new(
            store.clone(),
            host.clone(),
            ControllerOptions::from_settings(settings),
        );

        if let Some(CoreEvent::SessionRestored { session_id, state }) =
            controller.restore(focus_util::now()).await
        {
            info!(session_id = %session_id, state = ?state, "Resumed persisted session");
        }

        let socket_path = &settings.service.socket_path;
        let mut ipc = IpcServer::new(socket_path);
        ipc.start()
            .await
            .with_context(|| format!("Failed to start IPC server at {:?}", socket_path))?;

        info!(socket_path = %socket_path.display(), "IPC server started");

        Ok(Self {
            dispatcher: Dispatcher {
                controller,
                ipc: Arc::new(ipc),
                store,
            },
            events,
            host,
            session_tick: settings.timing.session_tick,
        })
    }

    pub fn socket_path(&self) -> &Path {
        self.dispatcher.ipc.socket_path()
    }

    /// Run until `shutdown` resolves, then lift enforcement and say goodbye.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let Service {
            mut dispatcher,
            events,
            host,
            session_tick,
        } = self;
        let ControllerEvents {
            mut enforcement,
            mut snooze_expired,
        } = events;

        let mut host_events = host.subscribe();
        let mut ipc_messages = dispatcher
            .ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let ipc_accept = dispatcher.ipc.clone();
        let accept_task = tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        let mut tick_timer = tokio::time::interval(session_tick);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!("Service running");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }

                _ = tick_timer.tick() => {
                    let now = focus_util::now();
                    let events = dispatcher.controller.tick(now).await;
                    dispatcher.publish(&events, now);
                }

                Some(expired) = snooze_expired.recv() => {
                    let now = focus_util::now();
                    let events = dispatcher.controller.handle_snooze_expired(expired, now).await;
                    dispatcher.publish(&events, now);
                }

                Some(event) = enforcement.recv() => {
                    dispatcher.handle_enforcement_event(event);
                }

                Ok(host_event) = host_events.recv() => {
                    dispatcher.handle_host_event(host_event).await;
                }

                Some(msg) = ipc_messages.recv() => {
                    dispatcher.handle_ipc_message(msg).await;
                }
            }
        }

        dispatcher.shutdown().await;
        accept_task.abort();

        info!("Shutdown complete");
        Ok(())
    }
}

impl Dispatcher {
    /// Forward core events to subscribers. Anything beyond a countdown tick
    /// also gets a fresh snapshot.
    fn publish(&self, events: &[CoreEvent], now: DateTime<Local>) {
        let mut changed = false;
        for event in events {
            if !matches!(event, CoreEvent::Tick { .. }) {
                changed = true;
            }
            if let Some(payload) = event_payload(event) {
                self.ipc.broadcast_event(Event::new(payload));
            }
        }

        if changed {
            self.broadcast_state(now);
        }
    }

    fn broadcast_state(&self, now: DateTime<Local>) {
        let snapshot = self.controller.snapshot(now);
        debug!(state = ?snapshot.state, "Broadcasting StateChanged");
        self.ipc
            .broadcast_event(Event::new(EventPayload::StateChanged(snapshot)));
    }

    fn handle_enforcement_event(&self, event: EnforcementEvent) {
        match event {
            EnforcementEvent::Blocked { target, kind } => {
                info!(target_name = %target, kind = %kind, "Blocked");
                self.ipc.broadcast_event(Event::new(EventPayload::BlockNotice {
                    target,
                    kind,
                    snooze_seconds: self.controller.default_snooze().as_secs(),
                }));
            }
        }
    }

    async fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::AppActivated { name } => {
                debug!(app = %name, "App activated");
                self.controller.nudge_enforcement();
            }

            HostEvent::SnoozeRequested { target, kind } => {
                let now = focus_util::now();
                match self.controller.snooze(&target, kind, None, now).await {
                    Ok(entry) => {
                        self.publish(&[snooze_started(&entry)], now);
                    }
                    Err(e) => {
                        warn!(target_name = %target, error = %e, "Snooze request from host rejected");
                    }
                }
            }
        }
    }

    async fn handle_ipc_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                let subscribing = matches!(request.command, Command::SubscribeEvents);
                let response = self
                    .handle_command(&client_id, request.request_id, request.command)
                    .await;

                let _ = self.ipc.send_response(&client_id, response).await;

                // New subscribers start from a full snapshot
                if subscribing {
                    let snapshot = self.controller.snapshot(focus_util::now());
                    let event = Event::new(EventPayload::StateChanged(snapshot));
                    if let Err(e) = self.ipc.send_event(&client_id, event).await {
                        debug!(client_id = %client_id, error = %e, "Subscriber went away");
                    }
                }
            }

            ServerMessage::ClientConnected { client_id, uid } => {
                info!(client_id = %client_id, uid = ?uid, "Client connected");
                let _ = self
                    .store
                    .append_audit(AuditEvent::new(AuditEventType::ClientConnected {
                        client_id: client_id.to_string(),
                    }));
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");
                let _ = self
                    .store
                    .append_audit(AuditEvent::new(AuditEventType::ClientDisconnected {
                        client_id: client_id.to_string(),
                    }));
            }
        }
    }

    async fn handle_command(
        &mut self,
        client_id: &ClientId,
        request_id: u64,
        command: Command,
    ) -> Response {
        let now = focus_util::now();

        match command {
            Command::GetState => {
                Response::success(request_id, ResponsePayload::State(self.controller.snapshot(now)))
            }

            Command::StartSession { plan } => {
                match self.controller.start(plan.into_session(), now).await {
                    Ok(event) => {
                        self.publish(&[event], now);
                        self.current_session_response(request_id, now)
                    }
                    Err(e) => error_response(request_id, e),
                }
            }

            Command::StartPreset { preset_id, goal } => {
                match self.controller.start_preset(preset_id, goal, now).await {
                    Ok(event) => {
                        self.publish(&[event], now);
                        self.current_session_response(request_id, now)
                    }
                    Err(e) => error_response(request_id, e),
                }
            }

            Command::Pause => match self.controller.pause(now).await {
                Ok(event) => {
                    self.publish(&[event], now);
                    self.current_session_response(request_id, now)
                }
                Err(e) => error_response(request_id, e),
            },

            Command::Resume => match self.controller.resume(now).await {
                Ok(event) => {
                    self.publish(&[event], now);
                    self.current_session_response(request_id, now)
                }
                Err(e) => error_response(request_id, e),
            },

            Command::Stop => match self.controller.stop(now).await {
                Ok(event) => {
                    self.publish(&[event], now);
                    let session = self
                        .controller
                        .history()
                        .last()
                        .map(|s| SessionInfo::from_session(s, now));
                    Response::success(request_id, ResponsePayload::Stopped { session })
                }
                Err(e) => error_response(request_id, e),
            },

            Command::Extend { by } => match self.controller.extend(by, now) {
                Ok(event) => {
                    let new_end = match &event {
                        CoreEvent::SessionExtended { ends_at, .. } => *ends_at,
                        _ => None,
                    };
                    self.publish(&[event], now);
                    Response::success(request_id, ResponsePayload::Extended { new_end })
                }
                Err(e) => error_response(request_id, e),
            },

            Command::Snooze {
                target,
                kind,
                duration,
            } => match self.controller.snooze(&target, kind, duration, now).await {
                Ok(entry) => {
                    self.publish(&[snooze_started(&entry)], now);
                    Response::success(request_id, ResponsePayload::Snoozed { entry })
                }
                Err(e) => error_response(request_id, e),
            },

            Command::ListPresets => Response::success(
                request_id,
                ResponsePayload::Presets {
                    presets: self.controller.presets().to_vec(),
                },
            ),

            Command::SavePreset { preset } => match self.controller.save_preset(preset) {
                Ok(preset) => Response::success(request_id, ResponsePayload::PresetSaved { preset }),
                Err(e) => error_response(request_id, e),
            },

            Command::DeletePreset { preset_id } => match self.controller.delete_preset(preset_id) {
                Ok(()) => Response::success(request_id, ResponsePayload::PresetDeleted),
                Err(e) => error_response(request_id, e),
            },

            Command::SavePresetFromSession { session_id } => {
                match self.controller.save_preset_from_session(session_id) {
                    Ok(preset) => {
                        Response::success(request_id, ResponsePayload::PresetSaved { preset })
                    }
                    Err(e) => error_response(request_id, e),
                }
            }

            Command::ListHistory => Response::success(
                request_id,
                ResponsePayload::History {
                    sessions: self.controller.history().to_vec(),
                },
            ),

            Command::DeleteHistoryEntry { session_id } => {
                match self.controller.delete_history_entry(session_id) {
                    Ok(()) => Response::success(request_id, ResponsePayload::HistoryEntryDeleted),
                    Err(e) => error_response(request_id, e),
                }
            }

            Command::ClearHistory => {
                let count = self.controller.clear_history();
                debug!(count, "History cleared");
                Response::success(request_id, ResponsePayload::HistoryCleared)
            }

            Command::ListCategories => {
                let categories = BlockCategory::ALL
                    .iter()
                    .copied()
                    .map(CategoryView::from)
                    .collect();
                Response::success(request_id, ResponsePayload::Categories { categories })
            }

            Command::ListInstalledApps => match self.controller.list_installed_apps().await {
                Ok(apps) => Response::success(request_id, ResponsePayload::InstalledApps { apps }),
                Err(e) => error_response(request_id, e),
            },

            Command::SubscribeEvents => Response::success(
                request_id,
                ResponsePayload::Subscribed {
                    client_id: client_id.clone(),
                },
            ),

            Command::UnsubscribeEvents => {
                Response::success(request_id, ResponsePayload::Unsubscribed)
            }

            Command::GetHealth => {
                Response::success(request_id, ResponsePayload::Health(self.controller.health()))
            }

            Command::Ping => Response::success(request_id, ResponsePayload::Pong),
        }
    }

    fn current_session_response(&self, request_id: u64, now: DateTime<Local>) -> Response {
        match self.controller.current_session() {
            Some(session) => Response::success(
                request_id,
                ResponsePayload::Session(SessionInfo::from_session(session, now)),
            ),
            None => error_response(request_id, FocusError::NoSession),
        }
    }

    async fn shutdown(&mut self) {
        info!("Shutting down focusd");

        self.controller.shutdown().await;
        self.ipc.broadcast_event(Event::new(EventPayload::Shutdown));

        if let Err(e) = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped))
        {
            warn!(error = %e, "Failed to log service shutdown");
        }

        self.ipc.shutdown();
    }
}

fn error_response(request_id: u64, err: impl Into<FocusError>) -> Response {
    let err: FocusError = err.into();
    debug!(error = %err, "Request rejected");
    Response::error(request_id, ErrorInfo::from(err))
}

fn snooze_started(entry: &focus_api::SnoozeEntry) -> CoreEvent {
    CoreEvent::SnoozeStarted {
        target: entry.target.clone(),
        kind: entry.kind,
        expires_at: entry.expires_at,
    }
}

/// Wire form of a core event. Restores only show up as a state change.
fn event_payload(event: &CoreEvent) -> Option<EventPayload> {
    let payload = match event.clone() {
        CoreEvent::SessionStarted {
            session_id,
            goal,
            ends_at,
        } => EventPayload::SessionStarted {
            session_id,
            goal,
            ends_at,
        },
        CoreEvent::SessionRestored { .. } => return None,
        CoreEvent::SessionPaused {
            session_id,
            remaining,
        } => EventPayload::SessionPaused {
            session_id,
            remaining,
        },
        CoreEvent::SessionResumed {
            session_id,
            remaining,
        } => EventPayload::SessionResumed {
            session_id,
            remaining,
        },
        CoreEvent::SessionExtended {
            session_id,
            by,
            ends_at,
        } => EventPayload::SessionExtended {
            session_id,
            by,
            ends_at,
        },
        CoreEvent::SessionEnded {
            session_id,
            reason,
            focused,
        } => EventPayload::SessionEnded {
            session_id,
            reason,
            focused,
        },
        CoreEvent::Tick {
            session_id,
            remaining,
        } => EventPayload::Tick {
            session_id,
            remaining,
        },
        CoreEvent::SnoozeStarted {
            target,
            kind,
            expires_at,
        } => EventPayload::SnoozeStarted {
            target,
            kind,
            expires_at,
        },
        CoreEvent::SnoozeEnded { target, kind } => EventPayload::SnoozeEnded { target, kind },
    };
    Some(payload)
}

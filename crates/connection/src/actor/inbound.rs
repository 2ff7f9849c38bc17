//! Handling of frames received from the hub.

use tracing::{debug, error, info, warn};

use hublink_devices::{Category, apply_state, capabilities, is_backed_by};
use hublink_protocol::constants::SUBSCRIBE_ID;
use hublink_protocol::{
    ClientFrame, EntityState, FrameType, HubFrame, RequestPurpose, StateList, decode,
};

use super::Actor;
use crate::registry::DeviceRegistration;
use crate::types::ConnectionState;

impl Actor {
    pub(super) fn handle_frame(&mut self, text: &str) {
        let frame = match decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, len = text.len(), "dropping undecodable frame");
                return;
            }
        };

        if let Some(message) = frame.error_message() {
            error!(id = ?frame.id, reason = message, "hub reported an error");
        }

        match frame.frame_type {
            FrameType::AuthRequired => {
                debug!("hub requested authentication");
                self.send(ClientFrame::auth(self.endpoint.token.clone()));
            }
            FrameType::AuthOk => {
                debug!("authenticated, fetching states");
                self.tracker.track_reserved(RequestPurpose::GetStates);
                self.send(ClientFrame::get_states());
            }
            FrameType::AuthInvalid => {
                error!("hub rejected the access token");
                self.disconnect();
                self.reconnect_timer.start(self.timings.reconnect_delay);
            }
            FrameType::Result => self.on_result(&frame),
            FrameType::Event => self.on_event(&frame),
            FrameType::Pong => self.on_pong(frame.id),
            FrameType::Unknown => debug!(id = ?frame.id, "ignoring frame of unknown type"),
        }
    }

    fn on_result(&mut self, frame: &HubFrame) {
        let Some(id) = frame.id else {
            debug!("result without id");
            return;
        };

        match self.tracker.resolve(id) {
            Some(RequestPurpose::GetStates) => {
                let list = frame.states().unwrap_or_else(|e| {
                    warn!(error = %e, "malformed state list");
                    StateList::default()
                });
                for skipped in &list.skipped {
                    warn!(
                        entity = ?skipped.entity_id,
                        error = %skipped.error,
                        "skipping malformed entity state"
                    );
                }
                self.on_states(&list.states);
            }
            Some(RequestPurpose::Subscribe) => self.on_subscribed(),
            Some(RequestPurpose::Command { entity_id, service }) => {
                if frame.success == Some(false) {
                    warn!(id, entity = %entity_id, service = %service, "command failed");
                } else {
                    debug!(id, entity = %entity_id, service = %service, "command acknowledged");
                }
            }
            Some(RequestPurpose::Ping) => debug!(id, "ping answered with a result"),
            None => debug!(id, "result for unknown request"),
        }
    }

    /// Registers every reported entity, seeds attributes of the devices they
    /// back, then subscribes to state changes.
    fn on_states(&mut self, states: &[EntityState]) {
        info!(count = states.len(), "received hub states");

        for state in states {
            let category = Category::from_entity_id(&state.entity_id);
            self.registry.register(DeviceRegistration {
                id: state.entity_id.clone(),
                capabilities: capabilities(&category, state.supported_features()),
                category,
                owner: self.endpoint.owner_id.clone(),
                friendly_name: state.friendly_name().to_string(),
            });
        }

        let devices = self.registry.list_by_owner(&self.endpoint.owner_id);
        for state in states {
            self.apply_to_backed(&devices, state);
        }

        self.tracker.track_reserved(RequestPurpose::Subscribe);
        self.send(ClientFrame::subscribe_state_changed());
    }

    fn on_subscribed(&mut self) {
        self.user_disconnect = false;
        self.retries.reset();
        self.set_state(ConnectionState::Connected);
        self.notifier.retract(&self.cannot_connect_message());
        self.start_heartbeat();
    }

    fn on_event(&mut self, frame: &HubFrame) {
        if !frame.is_for(SUBSCRIBE_ID) {
            debug!(id = ?frame.id, "event for unknown subscription");
            return;
        }

        let change = match frame.state_change() {
            Ok(Some(change)) => change,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "malformed state_changed event");
                return;
            }
        };
        let Some(state) = change.new_state else {
            debug!(entity = %change.entity_id, "entity removed");
            return;
        };

        let devices = self.registry.list_by_owner(&self.endpoint.owner_id);
        self.apply_to_backed(&devices, &state);
    }

    /// Translates `state` for every device backed by its entity and writes
    /// the non-empty results to the registry.
    fn apply_to_backed(&self, devices: &[hublink_devices::Device], state: &EntityState) {
        for device in devices.iter().filter(|d| is_backed_by(&d.id, &state.entity_id)) {
            let updates = apply_state(&device.category, &device.capabilities, state, &self.base_url);
            if updates.is_empty() {
                continue;
            }
            debug!(device = %device.id, count = updates.len(), "updating attributes");
            self.registry.update_attributes(&device.id, &updates);
        }
    }
}

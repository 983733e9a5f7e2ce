//! Address operations, including the single-default invariant.

use tracing::instrument;

use shopsync_client::{Address, CreateAddress, UpdateAddress};
use shopsync_core::AddressId;

use crate::outcome::Outcome;
use crate::refresh::POST_MUTATION_SETTLE;
use crate::session::Session;
use crate::state::{SessionState, apply_address_entry};

/// Input for saving a new address. The session injects the user id.
#[derive(Debug, Clone)]
pub struct AddressInput {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
}

/// Insert/replace an address record without touching the default pointer.
///
/// Used by the update path: field edits show optimistically, but default
/// transitions only apply once the server confirms.
fn apply_address_record(state: &mut SessionState, id: &AddressId, entry: Option<Address>) {
    match entry {
        Some(address) => {
            state.addresses.insert(id.clone(), address);
        }
        None => {
            state.addresses.remove(id);
        }
    }
}

/// Merge a partial update into an existing record, for the optimistic
/// local guess.
fn merge_update(mut address: Address, update: &UpdateAddress) -> Address {
    if let Some(name) = &update.name {
        address.name = name.clone();
    }
    if let Some(phone) = &update.phone {
        address.phone = phone.clone();
    }
    if let Some(line1) = &update.address_line1 {
        address.address_line1 = line1.clone();
    }
    if update.address_line2.is_some() {
        address.address_line2 = update.address_line2.clone();
    }
    if update.landmark.is_some() {
        address.landmark = update.landmark.clone();
    }
    if let Some(city) = &update.city {
        address.city = city.clone();
    }
    if let Some(state) = &update.state {
        address.state = state.clone();
    }
    if let Some(pincode) = &update.pincode {
        address.pincode = pincode.clone();
    }
    if let Some(is_default) = update.is_default {
        address.is_default = is_default;
    }
    address
}

impl Session {
    /// Optimistic write primitive: insert/replace the address if `Some`,
    /// delete it if `None`. Keeps the default pointer consistent.
    /// Synchronous, never fails, no network effect.
    pub fn set_address_entry(&self, id: &AddressId, entry: Option<Address>) {
        {
            let mut state = self.lock_state();
            apply_address_entry(&mut state, id, entry);
        }
        self.force_address_refresh();
    }

    /// Save a new address.
    #[instrument(skip(self, input))]
    pub async fn create_address(&self, input: AddressInput) -> Outcome<Address> {
        let Some(user) = self.current_user_id() else {
            return Outcome::failed("User not authenticated");
        };
        let Some(_flag) = self.inner.adding_address.try_begin() else {
            return Outcome::failed("Address creation already in progress");
        };

        let payload = CreateAddress {
            user_id: user,
            name: input.name,
            phone: input.phone,
            address_line1: input.address_line1,
            address_line2: input.address_line2,
            landmark: input.landmark,
            city: input.city,
            state: input.state,
            pincode: input.pincode,
            is_default: input.is_default,
        };

        let epoch = self.current_epoch();
        match self.inner.api.create_address(payload).await {
            Ok(address) => {
                let id = address.id.clone();
                self.apply_if_current(epoch, |state| {
                    apply_address_entry(state, &id, Some(address.clone()));
                });
                self.force_address_refresh();
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::ok_with(address, "Address created successfully")
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Update an existing address.
    ///
    /// Field edits apply optimistically from the merged local guess; the
    /// server's record replaces it on success.
    #[instrument(skip(self, update), fields(address = %id))]
    pub async fn update_address(&self, id: &AddressId, update: UpdateAddress) -> Outcome<Address> {
        let Some(_guard) = self.inner.updating_address.try_acquire(id.clone()) else {
            return Outcome::failed("Address update already in progress");
        };

        let Some(current) = self.lock_state().addresses.get(id).cloned() else {
            return Outcome::failed("Address not found");
        };
        let merged = merge_update(current, &update);

        let result = self
            .with_optimistic_update(
                |state| state.addresses.get(id).cloned(),
                |state, entry| apply_address_record(state, id, entry),
                Some(merged),
                self.inner.api.update_address(id, update),
            )
            .await;
        self.force_address_refresh();

        match result {
            Ok(address) => {
                let epoch = self.current_epoch();
                self.apply_if_current(epoch, |state| {
                    apply_address_entry(state, id, Some(address.clone()));
                });
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::ok_with(address, "Address updated successfully")
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Delete an address, optimistically.
    ///
    /// Deleting the current default clears the default pointer; no other
    /// address is promoted.
    #[instrument(skip(self), fields(address = %id))]
    pub async fn delete_address(&self, id: &AddressId) -> Outcome {
        let Some(_guard) = self.inner.deleting_address.try_acquire(id.clone()) else {
            return Outcome::failed("Address deletion already in progress");
        };

        if !self.lock_state().addresses.contains_key(id) {
            return Outcome::failed("Address not found");
        }

        let result = self
            .with_optimistic_update(
                |state| state.addresses.get(id).cloned(),
                |state, entry| apply_address_entry(state, id, entry),
                None,
                self.inner.api.delete_address(id),
            )
            .await;
        self.force_address_refresh();

        match result {
            Ok(()) => {
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::done_with("Address deleted successfully")
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Make an address the default.
    ///
    /// On success every other address's flag is rewritten to false in the
    /// same state update, so no reader ever observes two defaults.
    #[instrument(skip(self), fields(address = %id))]
    pub async fn set_default_address(&self, id: &AddressId) -> Outcome {
        let Some(user) = self.current_user_id() else {
            return Outcome::failed("User not authenticated");
        };
        let Some(_flag) = self.inner.setting_default_address.try_begin() else {
            return Outcome::failed("Default change already in progress");
        };

        if !self.lock_state().addresses.contains_key(id) {
            return Outcome::failed("Address not found");
        }

        let epoch = self.current_epoch();
        match self.inner.api.set_default_address(id, &user).await {
            Ok(()) => {
                self.apply_if_current(epoch, |state| {
                    state.default_address_id = Some(id.clone());
                    for (key, address) in &mut state.addresses {
                        address.is_default = key == id;
                    }
                });
                self.force_address_refresh();
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::done_with("Address set as default successfully")
            }
            Err(e) => Outcome::from_error(&e),
        }
    }
}

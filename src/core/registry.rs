use crate::client::Client;
use crate::error::StateChangeError;
use crate::util::BuildIdHasher;

use winsys::window::Window;

use slotmap::new_key_type;
use slotmap::SlotMap;

use std::collections::HashMap;

new_key_type! {
    /// Stable handle to a managed client. A handle is never reused for a
    /// different client.
    pub struct ClientId;
}

/// Owns every managed client. Keeps the client list (arrangement order)
/// and the stack list (most recently focused first), both over handles.
pub struct Registry {
    slots: SlotMap<ClientId, Client>,
    windows: HashMap<Window, ClientId, BuildIdHasher>,
    clients: Vec<ClientId>,
    stack: Vec<ClientId>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(50),
            windows: HashMap::with_capacity_and_hasher(50, BuildIdHasher),
            clients: Vec::with_capacity(50),
            stack: Vec::with_capacity(50),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    #[inline]
    pub fn contains(
        &self,
        window: Window,
    ) -> bool {
        self.windows.contains_key(&window)
    }

    #[inline]
    pub fn id_of(
        &self,
        window: Window,
    ) -> Option<ClientId> {
        self.windows.get(&window).copied()
    }

    #[inline]
    pub fn get(
        &self,
        id: ClientId,
    ) -> Option<&Client> {
        self.slots.get(id)
    }

    #[inline]
    pub fn get_by_window(
        &self,
        window: Window,
    ) -> Option<&Client> {
        self.id_of(window).and_then(|id| self.get(id))
    }

    /// Handles in arrangement order.
    #[inline]
    pub fn clients(&self) -> &[ClientId] {
        &self.clients
    }

    /// Handles in focus history order, most recent first.
    #[inline]
    pub fn stack(&self) -> &[ClientId] {
        &self.stack
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClientId, &Client)> {
        self.clients
            .iter()
            .filter_map(move |&id| self.get(id).map(|client| (id, client)))
    }

    pub fn iter_stack(&self) -> impl Iterator<Item = (ClientId, &Client)> {
        self.stack
            .iter()
            .filter_map(move |&id| self.get(id).map(|client| (id, client)))
    }

    /// Adds a client at the front of both lists.
    pub fn insert(
        &mut self,
        client: Client,
    ) -> Result<ClientId, StateChangeError> {
        let window = client.window();

        if self.windows.contains_key(&window) {
            return Err(StateChangeError::InvalidCaller);
        }

        let id = self.slots.insert(client);
        self.windows.insert(window, id);
        self.clients.insert(0, id);
        self.stack.insert(0, id);

        Ok(id)
    }

    /// Detaches a client from both lists and hands it back.
    pub fn remove(
        &mut self,
        id: ClientId,
    ) -> Option<Client> {
        let client = self.slots.remove(id)?;

        self.windows.remove(&client.window());
        self.clients.retain(|&other| other != id);
        self.stack.retain(|&other| other != id);

        Some(client)
    }

    /// Moves a client to the front of the focus history.
    pub fn raise_in_stack(
        &mut self,
        id: ClientId,
    ) -> Result<(), StateChangeError> {
        let index = self
            .stack
            .iter()
            .position(|&other| other == id)
            .ok_or(StateChangeError::InvalidCaller)?;

        if index == 0 {
            return Err(StateChangeError::EarlyStop);
        }

        let id = self.stack.remove(index);
        self.stack.insert(0, id);

        Ok(())
    }

    /// Moves a client to the front of the arrangement order.
    pub fn move_to_front(
        &mut self,
        id: ClientId,
    ) -> Result<(), StateChangeError> {
        let index = self
            .clients
            .iter()
            .position(|&other| other == id)
            .ok_or(StateChangeError::InvalidCaller)?;

        if index == 0 {
            return Err(StateChangeError::EarlyStop);
        }

        let id = self.clients.remove(index);
        self.clients.insert(0, id);

        Ok(())
    }

    pub fn swap(
        &mut self,
        a: ClientId,
        b: ClientId,
    ) -> Result<(), StateChangeError> {
        if a == b {
            return Err(StateChangeError::EarlyStop);
        }

        let index_a = self.clients.iter().position(|&other| other == a);
        let index_b = self.clients.iter().position(|&other| other == b);

        match (index_a, index_b) {
            (Some(index_a), Some(index_b)) => {
                self.clients.swap(index_a, index_b);
                Ok(())
            },
            _ => Err(StateChangeError::InvalidCaller),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

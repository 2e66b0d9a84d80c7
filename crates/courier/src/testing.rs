//! In-memory backend for unit tests.
//!
//! Behaves like the delivery service where it matters: one agent per email
//! (409 otherwise), 404 for unknown ids, 400 for a second delivery on the same
//! order. Failures can be scripted per call.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use resto_core::{
    AgentId, ClientId, ClientProfile, Delivery, DeliveryAgent, DeliveryId, DeliveryUpdate, Email,
    NewDelivery, NewDeliveryAgent,
};

use crate::directory::{AgentDirectory, ClientDirectory, DeliveryBoard};
use crate::gateway::GatewayError;

/// A client profile with placeholder contact details.
pub fn profile(id: &str, email: &str) -> ClientProfile {
    ClientProfile {
        id: ClientId::parse(id).unwrap(),
        first_name: "Jean".to_string(),
        last_name: "Dupont".to_string(),
        email: Email::parse(email).unwrap(),
        phone: Some("0601020304".to_string()),
        address: Some("1 rue de la Paix".to_string()),
        city: Some("Paris".to_string()),
        postal_code: Some("75002".to_string()),
    }
}

/// A bare agent record.
pub fn agent(id: &str, email: &str) -> DeliveryAgent {
    DeliveryAgent {
        id: AgentId::parse(id).unwrap(),
        email: email.to_string(),
        nom: None,
        prenom: None,
        telephone: None,
        vehicule: None,
        numero_licence: None,
        statut: None,
    }
}

/// A delivery assigned to `agent_id`.
pub fn delivery(id: &str, agent_id: &str, statut: resto_core::DeliveryStatus) -> Delivery {
    Delivery {
        id: DeliveryId::parse(id).unwrap(),
        commande_id: None,
        statut,
        adresse_depart: NewDelivery::DEFAULT_PICKUP.to_string(),
        adresse_arrivee: "5 avenue Foch".to_string(),
        client_nom: "Client".to_string(),
        client_telephone: None,
        commentaires: None,
        livreur_id: Some(AgentId::parse(agent_id).unwrap()),
        prix_livraison: None,
        distance_km: None,
        temps_estime: None,
    }
}

/// Scripted result of the next `create_agent` call.
#[derive(Debug, Clone, Copy)]
pub enum CreateOutcome {
    /// 500 without creating anything.
    ServerError,
    /// The agent is created but the caller sees a 500.
    LostResponse,
    /// 400 without creating anything.
    Rejected,
    /// Another session creates the agent first; this call gets 409.
    ConflictAfterRace,
    /// 409 on a field other than the email; nothing is created.
    ConflictOnCredential,
}

/// Call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub profile_reads: u32,
    pub agent_reads: u32,
    pub lists: u32,
    pub creates: u32,
    pub deletes: u32,
    pub delivery_lists: u32,
    pub delivery_updates: u32,
    pub dispatches: u32,
}

#[derive(Default)]
struct State {
    clients: Vec<ClientProfile>,
    agents: Vec<DeliveryAgent>,
    next_agent: u32,
    created: Vec<NewDeliveryAgent>,
    create_script: VecDeque<CreateOutcome>,
    failing_agent_reads: u32,
    failing_lists: u32,
    list_gate: Option<Arc<Barrier>>,
    gated_lists: usize,
    deliveries: Vec<Delivery>,
    next_delivery: u32,
    calls: Calls,
}

impl State {
    fn insert_agent(&mut self, email: &str) -> DeliveryAgent {
        self.next_agent += 1;
        let agent = agent(&format!("A{}", self.next_agent), email);
        self.agents.push(agent.clone());
        agent
    }
}

fn server_error() -> GatewayError {
    GatewayError::Server {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(self, profile: ClientProfile) -> Self {
        self.state.lock().unwrap().clients.push(profile);
        self
    }

    /// Seed an agent. Seeded ids do not advance the generated `A<n>` sequence.
    pub fn with_agent(self, id: &str, email: &str) -> Self {
        self.state.lock().unwrap().agents.push(agent(id, email));
        self
    }

    pub fn with_delivery(self, delivery: Delivery) -> Self {
        self.state.lock().unwrap().deliveries.push(delivery);
        self
    }

    pub fn script_create(&self, outcome: CreateOutcome) {
        self.state.lock().unwrap().create_script.push_back(outcome);
    }

    pub fn fail_next_agent_reads(&self, count: u32) {
        self.state.lock().unwrap().failing_agent_reads = count;
    }

    pub fn fail_next_lists(&self, count: u32) {
        self.state.lock().unwrap().failing_lists = count;
    }

    /// Hold the next `count` listings until all of them have listed.
    pub fn gate_next_lists(&self, count: usize) {
        let mut state = self.state.lock().unwrap();
        state.list_gate = Some(Arc::new(Barrier::new(count)));
        state.gated_lists = count;
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    pub fn agents(&self) -> Vec<DeliveryAgent> {
        self.state.lock().unwrap().agents.clone()
    }

    pub fn created_payloads(&self) -> Vec<NewDeliveryAgent> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.lock().unwrap().deliveries.clone()
    }
}

#[async_trait]
impl ClientDirectory for FakeBackend {
    async fn client(&self, client_id: &ClientId) -> Result<ClientProfile, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.profile_reads += 1;
        state
            .clients
            .iter()
            .find(|c| &c.id == client_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("client {client_id}")))
    }
}

#[async_trait]
impl AgentDirectory for FakeBackend {
    async fn agent(&self, agent_id: &AgentId) -> Result<DeliveryAgent, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.agent_reads += 1;
        if state.failing_agent_reads > 0 {
            state.failing_agent_reads -= 1;
            return Err(server_error());
        }
        state
            .agents
            .iter()
            .find(|a| &a.id == agent_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("livreur {agent_id}")))
    }

    async fn agents(&self) -> Result<Vec<DeliveryAgent>, GatewayError> {
        let (listing, gate) = {
            let mut state = self.state.lock().unwrap();
            state.calls.lists += 1;
            let listing = if state.failing_lists > 0 {
                state.failing_lists -= 1;
                Err(server_error())
            } else {
                Ok(state.agents.clone())
            };
            let gate = if state.gated_lists > 0 {
                state.gated_lists -= 1;
                state.list_gate.clone()
            } else {
                None
            };
            (listing, gate)
        };
        if let Some(gate) = gate {
            gate.wait().await;
        }
        listing
    }

    async fn create_agent(&self, new: &NewDeliveryAgent) -> Result<DeliveryAgent, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.creates += 1;
        state.created.push(new.clone());

        match state.create_script.pop_front() {
            Some(CreateOutcome::ServerError) => return Err(server_error()),
            Some(CreateOutcome::LostResponse) => {
                state.insert_agent(new.email.as_str());
                return Err(server_error());
            }
            Some(CreateOutcome::Rejected) => {
                return Err(GatewayError::Api {
                    status: 400,
                    message: "Bad Request".to_string(),
                });
            }
            Some(CreateOutcome::ConflictAfterRace) => {
                state.insert_agent(new.email.as_str());
                return Err(GatewayError::Conflict("Email déjà utilisé".to_string()));
            }
            Some(CreateOutcome::ConflictOnCredential) => {
                return Err(GatewayError::Conflict("Licence déjà utilisée".to_string()));
            }
            None => {}
        }

        if state.agents.iter().any(|a| new.email.matches(&a.email)) {
            return Err(GatewayError::Conflict("Email déjà utilisé".to_string()));
        }
        Ok(state.insert_agent(new.email.as_str()))
    }

    async fn delete_agent(&self, agent_id: &AgentId) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.deletes += 1;
        let before = state.agents.len();
        state.agents.retain(|a| &a.id != agent_id);
        if state.agents.len() == before {
            return Err(GatewayError::NotFound(format!("livreur {agent_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DeliveryBoard for FakeBackend {
    async fn deliveries_for_agent(&self, agent_id: &AgentId) -> Result<Vec<Delivery>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.delivery_lists += 1;
        Ok(state
            .deliveries
            .iter()
            .filter(|d| d.livreur_id.as_ref() == Some(agent_id))
            .cloned()
            .collect())
    }

    async fn update_delivery(
        &self,
        delivery_id: &DeliveryId,
        update: &DeliveryUpdate,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.delivery_updates += 1;
        let delivery = state
            .deliveries
            .iter_mut()
            .find(|d| &d.id == delivery_id)
            .ok_or_else(|| GatewayError::NotFound(format!("livraison {delivery_id}")))?;
        delivery.statut = update.statut;
        delivery.livreur_id = Some(update.livreur_id.clone());
        Ok(())
    }

    async fn create_delivery(&self, new: &NewDelivery) -> Result<Delivery, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.dispatches += 1;
        if state
            .deliveries
            .iter()
            .any(|d| d.commande_id.as_ref() == Some(&new.commande_id))
        {
            return Err(GatewayError::Api {
                status: 400,
                message: "Livraison déjà existante pour cette commande".to_string(),
            });
        }

        state.next_delivery += 1;
        let created = Delivery {
            id: DeliveryId::parse(&format!("D{}", state.next_delivery)).unwrap(),
            commande_id: Some(new.commande_id.clone()),
            statut: resto_core::DeliveryStatus::EnAttente,
            adresse_depart: new.adresse_depart.clone(),
            adresse_arrivee: new.adresse_arrivee.clone(),
            client_nom: new.client_nom.clone(),
            client_telephone: Some(new.client_telephone.clone()),
            commentaires: Some(new.commentaires.clone()),
            livreur_id: None,
            prix_livraison: Some(new.prix_livraison),
            distance_km: Some(new.distance_km),
            temps_estime: Some(new.temps_estime),
        };
        state.deliveries.push(created.clone());
        Ok(created)
    }
}

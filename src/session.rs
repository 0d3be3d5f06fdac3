//! Per-connection context shared by the dispatch loop.
//!
//! A [`Session`] bundles everything a flow needs: the catalog snapshot, the
//! connected service, the language model, the operator, and the record
//! store. It is built once after connecting and passed by reference; nothing
//! here is global.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_text_client::session::Session;
//!
//! let session = Session::new(catalog, service, model, operator, relay, store);
//! assert_eq!(session.tools().len(), session.catalog().tools().count());
//! ```

use std::sync::Arc;

use crate::llm::{LanguageModel, ToolSet};
use crate::mcp::catalog::Catalog;
use crate::mcp::service::CapabilityService;
use crate::operator::Operator;
use crate::records::RecordStore;
use crate::relay::PromptRelay;

pub struct Session {
    catalog: Catalog,
    service: Arc<dyn CapabilityService>,
    model: Arc<dyn LanguageModel>,
    operator: Arc<dyn Operator>,
    relay: Arc<PromptRelay>,
    store: RecordStore,
    /// Catalog tools bound for model use, built once per catalog.
    tools: ToolSet,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("catalog", &self.catalog)
            .field("model", &self.model.model_name())
            .field("store", &self.store)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        catalog: Catalog,
        service: Arc<dyn CapabilityService>,
        model: Arc<dyn LanguageModel>,
        operator: Arc<dyn Operator>,
        relay: Arc<PromptRelay>,
        store: RecordStore,
    ) -> Self {
        let tools = ToolSet::from_catalog(&catalog, &service);
        Self {
            catalog,
            service,
            model,
            operator,
            relay,
            store,
            tools,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn service(&self) -> &dyn CapabilityService {
        self.service.as_ref()
    }

    pub fn model(&self) -> &dyn LanguageModel {
        self.model.as_ref()
    }

    pub fn operator(&self) -> &dyn Operator {
        self.operator.as_ref()
    }

    pub fn relay(&self) -> &PromptRelay {
        &self.relay
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }
}

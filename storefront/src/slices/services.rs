//! Service catalog.

use crate::environment::{AppEnvironment, Backend, IdentityProvider};
use crate::error::ApiFailure;
use crate::request::{request_effect, Loadable};
use cyclecare_api::{CycleType, Service, ServiceId};
use cyclecare_core::effect::Effect;
use cyclecare_core::reducer::Reducer;
use cyclecare_core::{smallvec, SmallVec};
use std::marker::PhantomData;

/// Services state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServicesState {
    /// Active services, by rank
    pub catalog: Loadable<Vec<Service>>,
    /// Service shown on its detail page
    pub detail: Loadable<Service>,
}

impl ServicesState {
    /// Catalog entry by id.
    #[must_use]
    pub fn service(&self, id: &ServiceId) -> Option<&Service> {
        self.catalog.value()?.iter().find(|s| &s.id == id)
    }

    /// Price of `id` for a bike type.
    #[must_use]
    pub fn price(&self, id: &ServiceId, cycle_type: CycleType) -> Option<u32> {
        self.service(id).map(|s| s.price_for(cycle_type))
    }
}

/// Services actions.
#[derive(Debug, Clone, PartialEq)]
pub enum ServicesAction {
    /// Fetch the catalog
    Load,
    /// Catalog arrived
    Loaded(Vec<Service>),
    /// Catalog request failed
    LoadFailed(ApiFailure),
    /// Fetch one service
    LoadOne {
        /// Service to fetch
        id: ServiceId,
    },
    /// Service arrived
    OneLoaded(Service),
    /// Service request failed
    OneFailed(ApiFailure),
}

impl ServicesAction {
    /// Failure carried by this action, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::LoadFailed(failure) | Self::OneFailed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Drop inactive services and sort by rank, then name.
#[must_use]
pub fn catalog_order(mut services: Vec<Service>) -> Vec<Service> {
    services.retain(|s| s.active);
    services.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.name.cmp(&b.name)));
    services
}

/// Services reducer.
#[derive(Debug, Clone, Copy)]
pub struct ServicesReducer<B, I> {
    _env: PhantomData<fn() -> (B, I)>,
}

impl<B, I> ServicesReducer<B, I> {
    /// Create a new services reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self { _env: PhantomData }
    }
}

impl<B, I> Default for ServicesReducer<B, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, I> Reducer for ServicesReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    type State = ServicesState;
    type Action = ServicesAction;
    type Environment = AppEnvironment<B, I>;

    fn reduce(
        &self,
        state: &mut ServicesState,
        action: ServicesAction,
        env: &AppEnvironment<B, I>,
    ) -> SmallVec<[Effect<ServicesAction>; 4]> {
        match action {
            ServicesAction::Load => {
                state.catalog = Loadable::Pending;
                let backend = env.backend.clone();
                smallvec![request_effect(
                    async move { backend.list_services().await },
                    ServicesAction::Loaded,
                    ServicesAction::LoadFailed,
                )]
            },
            ServicesAction::Loaded(services) => {
                let services = catalog_order(services);
                tracing::debug!(count = services.len(), "Service catalog loaded");
                state.catalog = Loadable::Fulfilled(services);
                smallvec![Effect::None]
            },
            ServicesAction::LoadFailed(failure) => {
                tracing::warn!(error = %failure, "Failed to load services");
                state.catalog = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },
            ServicesAction::LoadOne { id } => {
                if let Some(service) = state.service(&id).cloned() {
                    state.detail = Loadable::Fulfilled(service);
                    return smallvec![Effect::None];
                }
                state.detail = Loadable::Pending;
                let backend = env.backend.clone();
                smallvec![request_effect(
                    async move { backend.service_by_id(&id).await },
                    ServicesAction::OneLoaded,
                    ServicesAction::OneFailed,
                )]
            },
            ServicesAction::OneLoaded(service) => {
                state.detail = Loadable::Fulfilled(service);
                smallvec![Effect::None]
            },
            ServicesAction::OneFailed(failure) => {
                state.detail = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{test_environment, MockBackend, MockIdentityProvider};
    use cyclecare_api::ServicePrices;
    use cyclecare_testing::{assertions, ReducerTest};
    use std::collections::BTreeMap;

    type TestReducer = ServicesReducer<MockBackend, MockIdentityProvider>;

    fn service(id: &str, rank: u32, active: bool) -> Service {
        Service {
            id: ServiceId::new(id),
            name: id.to_string(),
            short_description: String::new(),
            rank,
            active,
            checklist: BTreeMap::new(),
            prices: ServicePrices {
                gear: 799,
                non_gear: 599,
            },
        }
    }

    #[test]
    fn catalog_hides_inactive_and_sorts_by_rank() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_environment())
            .given_state(ServicesState::default())
            .when_action(ServicesAction::Loaded(vec![
                service("premium", 3, true),
                service("legacy", 1, false),
                service("basic", 1, true),
                service("standard", 2, true),
            ]))
            .then_state(|state| {
                let names: Vec<_> = state
                    .catalog
                    .value()
                    .map(|s| s.iter().map(|s| s.name.as_str()).collect())
                    .unwrap_or_default();
                assert_eq!(names, vec!["basic", "standard", "premium"]);
            })
            .run();
    }

    #[test]
    fn price_depends_on_cycle_type() {
        let state = ServicesState {
            catalog: Loadable::Fulfilled(vec![service("basic", 1, true)]),
            detail: Loadable::Idle,
        };
        let id = ServiceId::new("basic");
        assert_eq!(state.price(&id, CycleType::Gear), Some(799));
        assert_eq!(state.price(&id, CycleType::NonGear), Some(599));
        assert_eq!(state.price(&ServiceId::new("nope"), CycleType::Gear), None);
    }

    #[test]
    fn cached_service_needs_no_request() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_environment())
            .given_state(ServicesState {
                catalog: Loadable::Fulfilled(vec![service("basic", 1, true)]),
                detail: Loadable::Idle,
            })
            .when_action(ServicesAction::LoadOne {
                id: ServiceId::new("basic"),
            })
            .then_state(|state| assert!(state.detail.value().is_some()))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn unknown_service_is_fetched() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_environment())
            .given_state(ServicesState::default())
            .when_action(ServicesAction::LoadOne {
                id: ServiceId::new("premium"),
            })
            .then_state(|state| assert!(state.detail.is_pending()))
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }
}

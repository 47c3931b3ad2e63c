//! City selection.
//!
//! The confirmed city id is persisted under `cityId`. The selection popup
//! opens whenever no stored id matches a loaded city.

use crate::environment::{AppEnvironment, Backend, IdentityProvider};
use crate::error::ApiFailure;
use crate::request::{request_effect, Loadable};
use crate::storage::{write_effect, CITY_ID_KEY};
use cyclecare_api::{City, CityId};
use cyclecare_core::effect::Effect;
use cyclecare_core::reducer::Reducer;
use cyclecare_core::{smallvec, SmallVec};
use std::marker::PhantomData;

/// City state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityState {
    /// Loaded city list
    pub cities: Loadable<Vec<City>>,
    /// Confirmed city
    pub selected: Option<CityId>,
    /// City highlighted in the popup, not yet confirmed
    pub highlighted: Option<CityId>,
    /// Whether the selection popup is shown
    pub popup_open: bool,
}

impl CityState {
    /// The confirmed city.
    #[must_use]
    pub fn selected_city(&self) -> Option<&City> {
        let id = self.selected?;
        self.cities.value()?.iter().find(|c| c.id == id)
    }

    fn is_known(&self, id: CityId) -> bool {
        self.cities
            .value()
            .is_some_and(|cities| cities.iter().any(|c| c.id == id))
    }
}

/// City actions.
#[derive(Debug, Clone, PartialEq)]
pub enum CityAction {
    /// Fetch the city list
    Load,
    /// City list arrived, together with the city id stored by an earlier run
    Loaded {
        /// Cities offered by the backend
        cities: Vec<City>,
        /// Persisted selection, if any
        stored: Option<CityId>,
    },
    /// City list request failed
    LoadFailed(ApiFailure),
    /// Reopen the popup to change city
    OpenPopup,
    /// Highlight a city in the popup
    Highlight {
        /// City to highlight
        id: CityId,
    },
    /// Confirm the highlighted city
    Confirm,
}

impl CityAction {
    /// Failure carried by this action, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::LoadFailed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// City reducer.
#[derive(Debug, Clone, Copy)]
pub struct CityReducer<B, I> {
    _env: PhantomData<fn() -> (B, I)>,
}

impl<B, I> CityReducer<B, I> {
    /// Create a new city reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self { _env: PhantomData }
    }
}

impl<B, I> Default for CityReducer<B, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, I> Reducer for CityReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    type State = CityState;
    type Action = CityAction;
    type Environment = AppEnvironment<B, I>;

    fn reduce(
        &self,
        state: &mut CityState,
        action: CityAction,
        env: &AppEnvironment<B, I>,
    ) -> SmallVec<[Effect<CityAction>; 4]> {
        match action {
            CityAction::Load => {
                if state.cities.is_pending() {
                    return smallvec![Effect::None];
                }
                state.cities = Loadable::Pending;
                let backend = env.backend.clone();
                let storage = env.storage.clone();
                smallvec![request_effect(
                    async move {
                        let cities = backend.list_cities().await?;
                        let stored = storage
                            .get(CITY_ID_KEY)
                            .and_then(|raw| raw.parse::<CityId>().ok());
                        Ok::<_, cyclecare_api::ApiError>((cities, stored))
                    },
                    |(cities, stored)| CityAction::Loaded { cities, stored },
                    CityAction::LoadFailed,
                )]
            },

            CityAction::Loaded { cities, stored } => {
                state.cities = Loadable::Fulfilled(cities);

                match stored {
                    Some(id) if state.is_known(id) => {
                        state.selected = Some(id);
                        state.highlighted = Some(id);
                        state.popup_open = false;
                    },
                    stale => {
                        if let Some(id) = stale {
                            tracing::info!(city_id = %id, "Stored city is no longer offered");
                        }
                        state.selected = None;
                        state.popup_open = true;
                    },
                }
                smallvec![Effect::None]
            },

            CityAction::LoadFailed(failure) => {
                tracing::warn!(error = %failure, "Failed to load cities");
                state.cities = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },

            CityAction::OpenPopup => {
                state.highlighted = state.selected;
                state.popup_open = true;
                smallvec![Effect::None]
            },

            CityAction::Highlight { id } => {
                if state.is_known(id) {
                    state.highlighted = Some(id);
                }
                smallvec![Effect::None]
            },

            CityAction::Confirm => {
                let Some(id) = state.highlighted.filter(|id| state.is_known(*id)) else {
                    return smallvec![Effect::None];
                };
                state.selected = Some(id);
                state.popup_open = false;
                tracing::info!(city_id = %id, "City confirmed");
                smallvec![write_effect(&env.storage, move |storage| {
                    storage.set(CITY_ID_KEY, &id.to_string());
                })]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{environment_with, test_environment, MockBackend, MockIdentityProvider};
    use crate::storage::{KeyValueStore, MemoryStore};
    use cyclecare_runtime::Store;
    use cyclecare_testing::{assertions, ReducerTest};
    use std::sync::Arc;

    type TestReducer = CityReducer<MockBackend, MockIdentityProvider>;

    fn pune() -> City {
        City {
            id: CityId::new(3),
            name: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            country: "India".to_string(),
            pincodes: vec!["411057".to_string()],
            serviceable: true,
        }
    }

    #[test]
    fn load_starts_request() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_environment())
            .given_state(CityState::default())
            .when_action(CityAction::Load)
            .then_state(|state| assert!(state.cities.is_pending()))
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    fn loaded(stored: Option<u32>) -> CityAction {
        CityAction::Loaded {
            cities: vec![pune()],
            stored: stored.map(CityId::new),
        }
    }

    #[test]
    fn popup_opens_without_stored_city() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_environment())
            .given_state(CityState::default())
            .when_action(loaded(None))
            .then_state(|state| {
                assert!(state.popup_open);
                assert_eq!(state.selected, None);
            })
            .run();
    }

    #[test]
    fn stored_city_is_restored() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_environment())
            .given_state(CityState::default())
            .when_action(loaded(Some(3)))
            .then_state(|state| {
                assert!(!state.popup_open);
                assert_eq!(state.selected_city().map(|c| c.name.as_str()), Some("Pune"));
            })
            .run();
    }

    #[test]
    fn stale_stored_city_reopens_popup() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_environment())
            .given_state(CityState::default())
            .when_action(loaded(Some(42)))
            .then_state(|state| {
                assert!(state.popup_open);
                assert_eq!(state.selected, None);
            })
            .run();
    }

    #[test]
    fn confirm_describes_the_write() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_environment())
            .given_state(CityState::default())
            .when_action(loaded(None))
            .when_action(CityAction::Highlight { id: CityId::new(3) })
            .when_action(CityAction::Confirm)
            .then_state(|state| {
                assert!(!state.popup_open);
                assert_eq!(state.selected, Some(CityId::new(3)));
            })
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[tokio::test]
    async fn load_reads_stored_city_and_confirm_persists() {
        let storage = Arc::new(MemoryStore::with_entries([(CITY_ID_KEY, "42")]));
        let backend = MockBackend::new().with_cities(vec![pune()]);
        let store = Store::new(
            CityState::default(),
            TestReducer::new(),
            environment_with(backend, storage.clone()),
        );

        store.send(CityAction::Load).await.unwrap().wait().await;
        assert!(store.state(|s| s.popup_open).await);

        store
            .send(CityAction::Highlight { id: CityId::new(3) })
            .await
            .unwrap()
            .wait()
            .await;
        store.send(CityAction::Confirm).await.unwrap().wait().await;
        assert_eq!(storage.get(CITY_ID_KEY).as_deref(), Some("3"));
    }

    #[test]
    fn unknown_city_cannot_be_highlighted() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_environment())
            .given_state(CityState::default())
            .when_action(loaded(None))
            .when_action(CityAction::Highlight { id: CityId::new(99) })
            .when_action(CityAction::Confirm)
            .then_state(|state| {
                assert!(state.popup_open);
                assert_eq!(state.selected, None);
            })
            .run();
    }
}

//! Landing content and contact details.

use crate::environment::{AppEnvironment, Backend, IdentityProvider};
use crate::error::ApiFailure;
use crate::request::{request_effect, Loadable};
use cyclecare_api::{ContactDetails, LandingContent};
use cyclecare_core::effect::Effect;
use cyclecare_core::reducer::Reducer;
use cyclecare_core::{smallvec, SmallVec};
use std::marker::PhantomData;

/// Content state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentState {
    /// Landing page blocks
    pub landing: Loadable<LandingContent>,
    /// Support contact card
    pub contact: Loadable<ContactDetails>,
}

/// Content actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentAction {
    /// Fetch landing content and contact details
    Load,
    /// Landing content arrived
    LandingLoaded(LandingContent),
    /// Landing content request failed
    LandingFailed(ApiFailure),
    /// Contact details arrived
    ContactLoaded(ContactDetails),
    /// Contact details request failed
    ContactFailed(ApiFailure),
}

impl ContentAction {
    /// Failure carried by this action, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::LandingFailed(failure) | Self::ContactFailed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Content reducer.
#[derive(Debug, Clone, Copy)]
pub struct ContentReducer<B, I> {
    _env: PhantomData<fn() -> (B, I)>,
}

impl<B, I> ContentReducer<B, I> {
    /// Create a new content reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self { _env: PhantomData }
    }
}

impl<B, I> Default for ContentReducer<B, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, I> Reducer for ContentReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    type State = ContentState;
    type Action = ContentAction;
    type Environment = AppEnvironment<B, I>;

    fn reduce(
        &self,
        state: &mut ContentState,
        action: ContentAction,
        env: &AppEnvironment<B, I>,
    ) -> SmallVec<[Effect<ContentAction>; 4]> {
        match action {
            ContentAction::Load => {
                state.landing = Loadable::Pending;
                state.contact = Loadable::Pending;

                let landing = env.backend.clone();
                let contact = env.backend.clone();
                smallvec![Effect::merge(vec![
                    request_effect(
                        async move { landing.landing_content().await },
                        ContentAction::LandingLoaded,
                        ContentAction::LandingFailed,
                    ),
                    request_effect(
                        async move { contact.contact_details().await },
                        ContentAction::ContactLoaded,
                        ContentAction::ContactFailed,
                    ),
                ])]
            },
            ContentAction::LandingLoaded(content) => {
                state.landing = Loadable::Fulfilled(content);
                smallvec![Effect::None]
            },
            ContentAction::LandingFailed(failure) => {
                tracing::warn!(error = %failure, "Failed to load landing content");
                state.landing = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },
            ContentAction::ContactLoaded(contact) => {
                state.contact = Loadable::Fulfilled(contact);
                smallvec![Effect::None]
            },
            ContentAction::ContactFailed(failure) => {
                tracing::warn!(error = %failure, "Failed to load contact details");
                state.contact = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },
        }
    }
}

//! Reducer composition utilities
//!
//! A parent reducer owns the state of its children as fields and wraps their
//! actions in one of its own variants. [`scope`] runs a child reducer on its
//! field and lifts the resulting effects into the parent action type.
//!
//! # Example
//!
//! ```
//! use cyclecare_core::composition::scope;
//! use cyclecare_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct CounterState {
//!     count: i32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Counter(CounterAction),
//! }
//!
//! #[derive(Default)]
//! struct AppState {
//!     counter: CounterState,
//! }
//!
//! let mut app = AppState::default();
//! let _effects = scope(
//!     &CounterReducer,
//!     &mut app.counter,
//!     CounterAction::Increment,
//!     &(),
//!     AppAction::Counter,
//! );
//! assert_eq!(app.counter.count, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Lift a batch of child effects into the parent action type.
pub fn lift<A, P>(effects: SmallVec<[Effect<A>; 4]>, embed: fn(A) -> P) -> SmallVec<[Effect<P>; 4]>
where
    A: Send + 'static,
    P: Send + 'static,
{
    effects
        .into_iter()
        .filter(|effect| !effect.is_none())
        .map(|effect| effect.map(embed))
        .collect()
}

/// Run a child reducer on its slice of state and lift its effects.
pub fn scope<R, P>(
    reducer: &R,
    state: &mut R::State,
    action: R::Action,
    env: &R::Environment,
    embed: fn(R::Action) -> P,
) -> SmallVec<[Effect<P>; 4]>
where
    R: Reducer,
    R::Action: Send + 'static,
    P: Send + 'static,
{
    lift(reducer.reduce(state, action, env), embed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smallvec;

    #[derive(Clone, Debug, PartialEq)]
    enum Child {
        Ping,
        Pong,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Parent {
        Child(Child),
    }

    #[derive(Default)]
    struct ChildState {
        pings: u32,
    }

    struct ChildReducer;

    impl Reducer for ChildReducer {
        type State = ChildState;
        type Action = Child;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut ChildState,
            action: Child,
            _env: &(),
        ) -> SmallVec<[Effect<Child>; 4]> {
            match action {
                Child::Ping => {
                    state.pings += 1;
                    smallvec![Effect::None, Effect::future(async { Some(Child::Pong) })]
                },
                Child::Pong => smallvec![Effect::None],
            }
        }
    }

    #[test]
    fn scope_updates_slice_and_lifts_effects() {
        let mut state = ChildState::default();
        let effects = scope(&ChildReducer, &mut state, Child::Ping, &(), Parent::Child);

        assert_eq!(state.pings, 1);
        assert_eq!(effects.len(), 1, "no-op effects are dropped");

        let mut effects = effects.into_iter();
        let Some(Effect::Future(fut)) = effects.next() else {
            unreachable!("expected the lifted future");
        };
        assert_eq!(tokio_test::block_on(fut), Some(Parent::Child(Child::Pong)));
    }

    #[test]
    fn lifting_only_no_ops_yields_nothing() {
        let effects: SmallVec<[Effect<Child>; 4]> = smallvec![Effect::None];
        assert!(lift(effects, Parent::Child).is_empty());
    }
}

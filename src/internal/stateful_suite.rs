use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TableError;
use crate::internal::case_table::{CaseTable, Entry};
use crate::internal::dynamic::{DynamicSuite, RuntimeTest, TestFn, test_fn};
use crate::internal::snapshotable::{Snapshotable, StatefulComponent};
use crate::internal::snapshoter::Snapshoter;

/// Builds a fresh component already driven to its state and prepared for capture.
pub type ComponentFactory = Arc<dyn Fn() -> Box<dyn Snapshotable> + Send + Sync>;

/// Type-erased [`StatefulComponentTests`].
pub trait AnyStatefulComponentTests: Send + Sync {
    fn tests(&self) -> Vec<(String, ComponentFactory)>;
}

pub struct EmptyStatefulComponentTests;

impl AnyStatefulComponentTests for EmptyStatefulComponentTests {
    fn tests(&self) -> Vec<(String, ComponentFactory)> {
        Vec::new()
    }
}

/// A component factory plus the named states to snapshot it in.
///
/// ```
/// use ratatui::{Frame, layout::Rect, widgets::Paragraph};
/// use tui_state_snapshots::{Snapshotable, StatefulComponent, StatefulComponentTests, states};
///
/// #[derive(Default)]
/// struct Banner(String);
///
/// impl StatefulComponent for Banner {
///     type State = String;
///     fn transit(&mut self, to: &String) {
///         self.0 = to.clone();
///     }
/// }
///
/// impl Snapshotable for Banner {
///     fn render(&self, f: &mut Frame, area: Rect) {
///         f.render_widget(Paragraph::new(self.0.as_str()), area);
///     }
/// }
///
/// let tests = StatefulComponentTests::declare(Banner::default, states![
///     "Welcome", "hello".to_string(),
///     "Farewell", "bye".to_string(),
/// ])
/// .unwrap();
/// assert_eq!(tests.len(), 2);
/// ```
pub struct StatefulComponentTests<C: StatefulComponent> {
    make: Arc<dyn Fn() -> C + Send + Sync>,
    states: Vec<(String, Arc<C::State>)>,
}

impl<C> StatefulComponentTests<C>
where
    C: StatefulComponent + Snapshotable + 'static,
    C::State: Send + Sync + 'static,
{
    pub fn new(factory: impl Fn() -> C + Send + Sync + 'static, states: CaseTable<C::State>) -> Self {
        Self {
            make: Arc::new(factory),
            states: states.into_iter().map(|(name, state)| (name, Arc::new(state))).collect(),
        }
    }

    /// Build from a flat `name, state, ...` declaration. See [`CaseTable::build`].
    pub fn declare(factory: impl Fn() -> C + Send + Sync + 'static, entries: Vec<Entry>) -> Result<Self, TableError>
    where
        C::State: Any,
    {
        Ok(Self::new(factory, CaseTable::build(entries)?))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<C> AnyStatefulComponentTests for StatefulComponentTests<C>
where
    C: StatefulComponent + Snapshotable + 'static,
    C::State: Send + Sync + 'static,
{
    fn tests(&self) -> Vec<(String, ComponentFactory)> {
        self.states
            .iter()
            .map(|(name, state)| {
                let make = Arc::clone(&self.make);
                let state = Arc::clone(state);
                let factory: ComponentFactory = Arc::new(move || -> Box<dyn Snapshotable> {
                    let mut component = make();
                    component.transit(&state);
                    component.prepare_for_snapshot();
                    Box::new(component)
                });
                (name.clone(), factory)
            })
            .collect()
    }
}

/// One runtime test per case: build, transit, prepare, capture.
pub fn runtime_tests_for(tests: &dyn AnyStatefulComponentTests) -> Vec<RuntimeTest> {
    tests
        .tests()
        .into_iter()
        .map(|(name, build)| {
            RuntimeTest::new(name, move |snapshoter| {
                let component = build();
                component.make_snapshot(snapshoter)?;
                Ok(())
            })
        })
        .collect()
}

/// Expand `table` into one runtime test per case, in declaration order.
pub fn synthesize<C>(table: CaseTable<C::State>, factory: impl Fn() -> C + Send + Sync + 'static) -> Vec<RuntimeTest>
where
    C: StatefulComponent + Snapshotable + 'static,
    C::State: Send + Sync + 'static,
{
    runtime_tests_for(&StatefulComponentTests::new(factory, table))
}

type Wrapper = Arc<dyn Fn(TestFn) -> TestFn + Send + Sync>;

/// Decorators for declared tests, keyed by name prefix.
#[derive(Clone, Default)]
pub struct WrapperRegistry {
    wrappers: HashMap<String, Wrapper>,
}

impl WrapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, prefix: impl Into<String>, wrapper: F)
    where
        F: Fn(TestFn) -> TestFn + Send + Sync + 'static,
    {
        self.wrappers.insert(prefix.into(), Arc::new(wrapper));
    }

    /// Run `hook` after every test with `prefix`, once the test itself succeeded.
    pub fn after_each<F>(&mut self, prefix: impl Into<String>, hook: F)
    where
        F: Fn(&mut Snapshoter) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let hook = Arc::new(hook);
        self.register(prefix, move |current: TestFn| {
            let hook = Arc::clone(&hook);
            test_fn(move |snapshoter| {
                current(snapshoter)?;
                hook(snapshoter)
            })
        });
    }

    /// Run `hook` before every test with `prefix`.
    pub fn before_each<F>(&mut self, prefix: impl Into<String>, hook: F)
    where
        F: Fn(&mut Snapshoter) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let hook = Arc::new(hook);
        self.register(prefix, move |current: TestFn| {
            let hook = Arc::clone(&hook);
            test_fn(move |snapshoter| {
                hook(snapshoter)?;
                current(snapshoter)
            })
        });
    }

    pub fn resolve(&self, prefix: &str, current: TestFn) -> Option<TestFn> {
        self.wrappers.get(prefix).map(|wrapper| wrapper(current))
    }

    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self.wrappers.keys().map(String::as_str).collect();
        prefixes.sort_unstable();
        prefixes
    }
}

/// Suite that snapshots one stateful component in every declared state.
pub struct StatefulComponentSuite {
    name: String,
    component_tests: Box<dyn AnyStatefulComponentTests>,
    declared: Vec<RuntimeTest>,
    wrappers: WrapperRegistry,
}

impl StatefulComponentSuite {
    pub fn new(name: impl Into<String>, component_tests: impl AnyStatefulComponentTests + 'static) -> Self {
        Self {
            name: name.into(),
            component_tests: Box::new(component_tests),
            declared: Vec::new(),
            wrappers: WrapperRegistry::new(),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, EmptyStatefulComponentTests)
    }

    /// Add a hand-written test, subject to prefix wrapping.
    pub fn with_test<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Snapshoter) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.declared.push(RuntimeTest::new(name, body));
        self
    }

    pub fn with_wrappers(mut self, wrappers: WrapperRegistry) -> Self {
        self.wrappers = wrappers;
        self
    }
}

impl DynamicSuite for StatefulComponentSuite {
    fn name(&self) -> &str {
        &self.name
    }

    fn runtime_tests(&self) -> Vec<RuntimeTest> {
        runtime_tests_for(self.component_tests.as_ref())
    }

    fn declared_tests(&self) -> Vec<RuntimeTest> {
        self.declared.clone()
    }

    fn method_implementation(&self, prefix: &str, current: TestFn) -> Option<TestFn> {
        self.wrappers.resolve(prefix, current)
    }
}

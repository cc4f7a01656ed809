//! Builtin registry consulted before launching external programs.

use crate::command::CommandFactory;

/// Adapts a builtin type into a [`CommandFactory`].
///
/// Only supports the builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Ordered, immutable table of in-process commands.
///
/// Built once and handed to [`crate::Interpreter::new`]. Lookup is a linear,
/// case-sensitive scan; the first entry whose name matches wins.
pub struct BuiltinRegistry {
    entries: Vec<Box<dyn CommandFactory>>,
}

impl BuiltinRegistry {
    /// Create a registry from the given entries, keeping their order.
    pub fn new(entries: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { entries }
    }

    /// Find the entry answering to `name`.
    pub fn resolve(&self, name: &str) -> Option<&dyn CommandFactory> {
        self.entries
            .iter()
            .find(|entry| entry.name() == name)
            .map(|entry| &**entry)
    }

    /// Names of all entries in registry order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name()).collect()
    }
}

impl Default for BuiltinRegistry {
    /// The standard builtins: `mycd`, `myhelp`, `myexit`, `myls`, `mycp`, `mymv`,
    /// `myclear`, `mypwd`, `mytouch` and `mymkdir`.
    fn default() -> Self {
        use crate::builtin::*;
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Ls>::default()),
            Box::new(Factory::<Cp>::default()),
            Box::new(Factory::<Mv>::default()),
            Box::new(Factory::<Clear>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Touch>::default()),
            Box::new(Factory::<Mkdir>::default()),
        ])
    }
}

impl std::fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("entries", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Continuation, ExecutableCommand, Streams};
    use crate::env::Environment;

    struct Noop;

    impl ExecutableCommand for Noop {
        fn execute(
            self: Box<Self>,
            _io: &mut Streams<'_>,
            _env: &mut Environment,
        ) -> anyhow::Result<Continuation> {
            Ok(Continuation::Continue)
        }
    }

    struct Named(&'static str);

    impl CommandFactory for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn create(&self, _args: &[&str]) -> Box<dyn ExecutableCommand> {
            Box::new(Noop)
        }
    }

    #[test]
    fn test_default_order() {
        let registry = BuiltinRegistry::default();
        assert_eq!(
            registry.names(),
            vec![
                "mycd", "myhelp", "myexit", "myls", "mycp", "mymv", "myclear", "mypwd", "mytouch",
                "mymkdir"
            ]
        );
    }

    #[test]
    fn test_resolve_exact_and_case_sensitive() {
        let registry = BuiltinRegistry::default();
        assert_eq!(registry.resolve("mycd").map(|f| f.name()), Some("mycd"));
        assert!(registry.resolve("MYCD").is_none());
        assert!(registry.resolve("my").is_none());
        assert!(registry.resolve("ls").is_none());
    }

    #[test]
    fn test_custom_registry() {
        let entries: Vec<Box<dyn CommandFactory>> =
            vec![Box::new(Named("first")), Box::new(Named("second"))];
        let registry = BuiltinRegistry::new(entries);
        assert_eq!(registry.names(), vec!["first", "second"]);
        assert!(registry.resolve("second").is_some());
        assert!(registry.resolve("mycd").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = BuiltinRegistry::new(Vec::new());
        assert!(registry.names().is_empty());
        assert!(registry.resolve("myexit").is_none());
    }
}

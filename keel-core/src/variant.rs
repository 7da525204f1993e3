use std::fmt::{self, Display};

/// Cursor movement requested for the result set of a query.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollMode {
    #[default]
    ForwardOnly,
    /// Scrollable, not sensitive to changes made by others.
    ScrollInsensitive,
    /// Scrollable, reflects changes made by others.
    ScrollSensitive,
}

impl ScrollMode {
    pub fn is_forward_only(&self) -> bool {
        *self == ScrollMode::ForwardOnly
    }
}

impl Display for ScrollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScrollMode::ForwardOnly => "forward-only",
            ScrollMode::ScrollInsensitive => "scroll-insensitive",
            ScrollMode::ScrollSensitive => "scroll-sensitive",
        })
    }
}

/// Which generated keys a statement must make available after execution.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum GeneratedKeys {
    /// Explicitly no generated keys.
    #[default]
    No,
    /// Every key the driver considers generated.
    All,
    /// Only the listed columns.
    Columns(Vec<String>),
}

impl GeneratedKeys {
    pub fn is_requested(&self) -> bool {
        !matches!(self, GeneratedKeys::No)
    }
}

/// The flavor of statement a caller asks for.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum Variant {
    /// No arguments, no flags. The only variant that leaves the pending batch alone.
    #[default]
    Plain,
    /// A call to a stored procedure.
    Callable,
    ReturnGeneratedKeys(GeneratedKeys),
    Scrollable {
        mode: ScrollMode,
        callable: bool,
    },
}

impl Variant {
    pub fn scrollable(mode: ScrollMode) -> Self {
        Variant::Scrollable {
            mode,
            callable: false,
        }
    }

    pub fn flushes_batch(&self) -> bool {
        !matches!(self, Variant::Plain)
    }

    /// Parameters forwarded to [`Provider::prepare_command`](crate::Provider::prepare_command).
    pub fn preparation(&self) -> Preparation {
        match self {
            Variant::Plain => Preparation::default(),
            Variant::Callable => Preparation {
                callable: true,
                ..Default::default()
            },
            Variant::ReturnGeneratedKeys(keys) => Preparation {
                generated_keys: keys.clone(),
                ..Default::default()
            },
            Variant::Scrollable { mode, callable } => Preparation {
                callable: *callable,
                scroll: Some(*mode),
                ..Default::default()
            },
        }
    }
}

/// Result set concurrency, scrollable statements are always prepared read only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concurrency {
    #[default]
    ReadOnly,
}

/// Driver level parameters of a single preparation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Preparation {
    pub callable: bool,
    /// `None` when the driver default cursor is requested.
    pub scroll: Option<ScrollMode>,
    pub concurrency: Concurrency,
    pub generated_keys: GeneratedKeys,
}

/// Which post processing the prepared statement receives.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// Data manipulation statements.
    #[default]
    Statement,
    /// Result producing statements, they also receive the fetch size hint.
    Query,
}

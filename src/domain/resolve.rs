//! Name Resolution
//!
//! Classifies a call target as internal to the project or external, from call
//! syntax alone. No types or imports are consulted, so results are
//! best-effort: attribute calls on ordinary objects are over-approximated as
//! internal, and anything more complex than a single attribute is dropped.

use tree_sitter::Node;

use crate::domain::callgraph::{qualify, QualifiedName};
use crate::domain::syntax::node_text;

/// The receiver of an attribute call `x.m()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// A bare identifier, `x`.
    Name(String),
    /// Anything else: `a.b`, `f()`, `xs[0]`, ...
    Expression,
}

/// Syntactic shape of the callee in a call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// `f()`
    Name(String),
    /// `receiver.method()`
    Attribute { receiver: Receiver, method: String },
    /// Call-of-call, subscript, lambda, ...
    Other,
}

impl CallTarget {
    /// Read the `function` field of a tree-sitter `call` node.
    pub fn from_node(function: Node, source: &[u8]) -> Self {
        match function.kind() {
            "identifier" => CallTarget::Name(node_text(function, source).to_string()),
            "attribute" => {
                let method = function
                    .child_by_field_name("attribute")
                    .map(|n| node_text(n, source).to_string());
                let receiver = match function.child_by_field_name("object") {
                    Some(object) if object.kind() == "identifier" => {
                        Receiver::Name(node_text(object, source).to_string())
                    }
                    _ => Receiver::Expression,
                };
                match method {
                    Some(method) => CallTarget::Attribute { receiver, method },
                    None => CallTarget::Other,
                }
            }
            _ => CallTarget::Other,
        }
    }

    /// The called name without any qualification: `f` for `f()`, `m` for `x.y.m()`.
    pub fn callee_name(&self) -> Option<&str> {
        match self {
            CallTarget::Name(name) => Some(name),
            CallTarget::Attribute { method, .. } => Some(method),
            CallTarget::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Internal(QualifiedName),
    External,
}

/// Strategy for deciding which calls belong to the analysed project.
pub trait NameResolver: Send + Sync {
    fn resolve(&self, target: &CallTarget, module: &str) -> Resolution;
}

/// Two syntactic rules:
/// - `f()` is internal, qualified as `<module>.f`;
/// - `x.m()` with a bare, undotted `x` is internal, qualified as `x.m`.
///
/// Every other shape is external.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicResolver;

impl NameResolver for HeuristicResolver {
    fn resolve(&self, target: &CallTarget, module: &str) -> Resolution {
        match target {
            CallTarget::Name(name) => Resolution::Internal(qualify(module, name)),
            CallTarget::Attribute {
                receiver: Receiver::Name(object),
                method,
            } if !object.contains('.') => Resolution::Internal(qualify(object, method)),
            _ => Resolution::External,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::syntax::calls_in_order;
    use crate::infrastructure::parser::PythonParser;

    fn targets(src: &str) -> Vec<CallTarget> {
        let tree = PythonParser::new().unwrap().parse_text(src).unwrap();
        calls_in_order(tree.root_node())
            .into_iter()
            .map(|call| {
                CallTarget::from_node(call.child_by_field_name("function").unwrap(), src.as_bytes())
            })
            .collect()
    }

    #[test]
    fn test_target_shapes() {
        let found = targets("f()\nx.m()\na.b.c()\ng()()\nxs[0]()\n");
        assert_eq!(found[0], CallTarget::Name("f".to_string()));
        assert_eq!(
            found[1],
            CallTarget::Attribute {
                receiver: Receiver::Name("x".to_string()),
                method: "m".to_string()
            }
        );
        assert_eq!(
            found[2],
            CallTarget::Attribute {
                receiver: Receiver::Expression,
                method: "c".to_string()
            }
        );
        // g()() yields the outer call first, then the inner g()
        assert_eq!(found[3], CallTarget::Other);
        assert_eq!(found[4], CallTarget::Name("g".to_string()));
        assert_eq!(found[5], CallTarget::Other);
    }

    #[test]
    fn test_bare_name_is_internal() {
        let resolved = HeuristicResolver.resolve(&CallTarget::Name("helper".into()), "pkg.util");
        assert_eq!(resolved, Resolution::Internal("pkg.util.helper".to_string()));
    }

    #[test]
    fn test_single_attribute_is_internal() {
        let target = CallTarget::Attribute {
            receiver: Receiver::Name("loader".into()),
            method: "load".into(),
        };
        assert_eq!(
            HeuristicResolver.resolve(&target, "pkg.main"),
            Resolution::Internal("loader.load".to_string())
        );
    }

    #[test]
    fn test_other_shapes_are_external() {
        let nested = CallTarget::Attribute {
            receiver: Receiver::Expression,
            method: "join".into(),
        };
        let dotted = CallTarget::Attribute {
            receiver: Receiver::Name("os.path".into()),
            method: "join".into(),
        };
        assert_eq!(HeuristicResolver.resolve(&nested, "m"), Resolution::External);
        assert_eq!(HeuristicResolver.resolve(&dotted, "m"), Resolution::External);
        assert_eq!(HeuristicResolver.resolve(&CallTarget::Other, "m"), Resolution::External);
    }

    #[test]
    fn test_callee_name() {
        assert_eq!(CallTarget::Name("f".into()).callee_name(), Some("f"));
        let attr = CallTarget::Attribute {
            receiver: Receiver::Expression,
            method: "run".into(),
        };
        assert_eq!(attr.callee_name(), Some("run"));
        assert_eq!(CallTarget::Other.callee_name(), None);
    }
}

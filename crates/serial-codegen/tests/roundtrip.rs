//! Executes generated fragment streams against a toy object model.

use pretty_assertions::assert_eq;
use serial_codegen::{
    CodeGenerator, DeclId, DeclarationGraph, Fragment, ModelExtractor, PackageRef, PackageToken,
    ValueKey, deserializer_fragments, serializer_fragments,
};
use std::collections::BTreeMap;

type Key = (PackageToken, DeclId, String);
type Entry = (Key, String);

#[derive(Debug, Clone, PartialEq)]
struct Instance {
    class: DeclId,
    type_arguments: BTreeMap<String, String>,
    state: BTreeMap<(DeclId, String), String>,
}

impl Instance {
    fn new(class: DeclId) -> Self {
        Self {
            class,
            type_arguments: BTreeMap::new(),
            state: BTreeMap::new(),
        }
    }

    fn with(mut self, graph: &DeclarationGraph, class: &str, attribute: &str, value: &str) -> Self {
        let class = graph.lookup(class).unwrap();
        self.state
            .insert((class, attribute.to_string()), value.to_string());
        self
    }
}

fn graph(source: &str) -> DeclarationGraph {
    ModelExtractor::new()
        .add_source_str(source)
        .unwrap()
        .build()
        .unwrap()
}

fn resolve(key: &ValueKey, bound: &Option<PackageToken>) -> Key {
    let package = match &key.package {
        PackageRef::Bound => bound.clone().expect("package used before it was bound"),
        PackageRef::Inline(token) => token.clone(),
    };
    (package, key.class, key.attribute.clone())
}

fn serialize(graph: &DeclarationGraph, class: DeclId, instance: &Instance, out: &mut Vec<Entry>) {
    let mut bound = None;
    for fragment in serializer_fragments(graph, class) {
        match fragment {
            Fragment::SerializeSuper { ancestor } => serialize(graph, ancestor, instance, out),
            Fragment::BindPackage(token) => bound = Some(token),
            Fragment::PutValue { key, .. } => {
                let value = instance.state[&(key.class, key.attribute.clone())].clone();
                out.push((resolve(&key, &bound), value));
            }
            _ => {}
        }
    }
}

/// Runs the deserializer of `class`; returns whether it returned the instance.
fn deserialize(
    graph: &DeclarationGraph,
    class: DeclId,
    stream: &mut impl Iterator<Item = Entry>,
    instance: &mut Option<Instance>,
) -> bool {
    let mut bound = None;
    let mut skipping = false;
    let mut returned = false;
    for fragment in deserializer_fragments(graph, class) {
        match fragment {
            Fragment::BeginAllocation => skipping = instance.is_some(),
            Fragment::EndAllocation => skipping = false,
            _ if skipping => {}
            Fragment::Allocate { class } => *instance = Some(Instance::new(class)),
            Fragment::SetTypeArguments(arguments) => {
                let instance = instance.as_mut().expect("type arguments set before allocation");
                for argument in arguments {
                    let previous = instance
                        .type_arguments
                        .insert(argument.key.clone(), format!("{:?}", argument.witness));
                    assert!(previous.is_none(), "{} bound twice", argument.key);
                }
            }
            Fragment::DeserializeSuper { ancestor } => {
                deserialize(graph, ancestor, stream, instance);
            }
            Fragment::BindPackage(token) => bound = Some(token),
            Fragment::GetValue { key, .. } => {
                let (written, value) = stream.next().expect("read past the written values");
                assert_eq!(written, resolve(&key, &bound));
                instance
                    .as_mut()
                    .expect("value read before allocation")
                    .state
                    .insert((key.class, key.attribute), value);
            }
            Fragment::ReturnInstance => returned = true,
            _ => {}
        }
    }
    returned
}

fn roundtrip(graph: &DeclarationGraph, instance: &Instance) -> (Vec<Entry>, Instance) {
    let mut written = Vec::new();
    serialize(graph, instance.class, instance, &mut written);

    let mut stream = written.clone().into_iter();
    let mut restored = None;
    assert!(deserialize(graph, instance.class, &mut stream, &mut restored));
    assert_eq!(stream.next(), None, "values left unread");
    (written, restored.expect("no instance returned"))
}

#[test]
fn test_point_roundtrip() {
    let graph = graph(
        r#"
        #![package = "shapes"]
        #[serializable]
        struct Point { x: Integer, y: Integer }
    "#,
    );
    let point = graph.lookup("Point").unwrap();
    let original = Instance::new(point)
        .with(&graph, "Point", "x", "1")
        .with(&graph, "Point", "y", "2");

    let (written, restored) = roundtrip(&graph, &original);
    let shapes = PackageToken::Named("shapes".to_string());
    assert_eq!(
        written,
        vec![
            ((shapes.clone(), point, "x".to_string()), "1".to_string()),
            ((shapes, point, "y".to_string()), "2".to_string()),
        ]
    );
    assert_eq!(restored.state, original.state);
}

#[test]
fn test_base_values_precede_derived_values() {
    let graph = graph(
        r#"
        #[serializable]
        #[abstract_class]
        struct Base { a: Integer }
        #[extends(Base)]
        #[abstract_class]
        struct Plain { b: Integer }
        #[serializable]
        #[extends(Plain)]
        struct Derived { c: Integer, d: Integer }
    "#,
    );
    let derived = graph.lookup("Derived").unwrap();
    let original = Instance::new(derived)
        .with(&graph, "Base", "a", "1")
        .with(&graph, "Plain", "b", "2")
        .with(&graph, "Derived", "c", "3")
        .with(&graph, "Derived", "d", "4");

    let (written, restored) = roundtrip(&graph, &original);
    let order: Vec<&str> = written.iter().map(|((_, _, name), _)| name.as_str()).collect();
    assert_eq!(order, vec!["a", "c", "d"]);
    // attributes of non-serializable classes are not persisted
    let mut expected = original.state.clone();
    expected.remove(&(graph.lookup("Plain").unwrap(), "b".to_string()));
    assert_eq!(restored.state, expected);
}

#[test]
fn test_transient_values_are_skipped() {
    let graph = graph(
        r#"
        #[serializable]
        struct Session { id: Integer, #[transient] cache: String, #[late] user: String }
    "#,
    );
    let session = graph.lookup("Session").unwrap();
    let original = Instance::new(session)
        .with(&graph, "Session", "id", "7")
        .with(&graph, "Session", "cache", "hot")
        .with(&graph, "Session", "user", "ada");

    let (written, restored) = roundtrip(&graph, &original);
    assert_eq!(written.len(), 2);
    assert!(!restored.state.contains_key(&(session, "cache".to_string())));
    assert_eq!(restored.state[&(session, "user".to_string())], "ada");
}

#[test]
fn test_diamond_type_arguments_bound_once() {
    let graph = graph(
        r#"
        trait Container<E> {}
        trait Left<L>: Container<L> {}
        trait Right<R>: Container<R> {}
        #[serializable]
        #[abstract_class]
        #[satisfies(Left<T>)]
        struct Base<T> { first: T }
        #[serializable]
        #[extends(Base<Integer>)]
        #[satisfies(Right<Integer>, Left<Integer>)]
        struct Leaf<U> { second: U }
    "#,
    );
    let leaf = graph.lookup("Leaf").unwrap();
    let original = Instance::new(leaf)
        .with(&graph, "Base", "first", "1")
        .with(&graph, "Leaf", "second", "2");

    let (_, restored) = roundtrip(&graph, &original);
    let keys: Vec<&str> = restored.type_arguments.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["E$Container", "L$Left", "R$Right", "T$Base", "U$Leaf"]
    );
}

#[test]
fn test_abstract_class_returns_nothing() {
    let graph = graph(
        r#"
        #[serializable]
        #[abstract_class]
        struct Shape { name: String }
    "#,
    );
    let shape = graph.lookup("Shape").unwrap();
    let written = vec![(
        (PackageToken::Named("default".to_string()), shape, "name".to_string()),
        "disc".to_string(),
    )];
    let mut stream = written.into_iter();
    let mut supplied = Some(Instance::new(shape));
    assert!(!deserialize(&graph, shape, &mut stream, &mut supplied));
    assert_eq!(
        supplied.unwrap().state[&(shape, "name".to_string())],
        "disc"
    );
}

#[test]
fn test_every_class_reads_what_it_writes() {
    let graph = graph(
        r#"
        #![package = "zoo"]
        trait Named {}
        #[serializable]
        #[abstract_class]
        #[satisfies(Named)]
        struct Animal<F> { #[param] name: String, food: F, #[formal] legs: Integer }
        #[serializable]
        #[extends(Animal<String>)]
        struct Cat { lives: Integer }
        #[extends(Cat)]
        struct Lion { mane: Boolean }
        #[serializable]
        #[extends(Lion)]
        struct Cub { age: Integer, #[setter] age: Integer }
        #[serializable]
        struct Keeper { id: Integer }
    "#,
    );
    for class in graph.serializable_classes() {
        let write_keys: Vec<_> = serializer_fragments(&graph, class)
            .iter()
            .filter_map(Fragment::value_key)
            .cloned()
            .collect();
        let read_keys: Vec<_> = deserializer_fragments(&graph, class)
            .iter()
            .filter_map(Fragment::value_key)
            .cloned()
            .collect();
        assert_eq!(write_keys, read_keys, "{}", graph[class].name);
    }

    let cub = graph.lookup("Cub").unwrap();
    let original = Instance::new(cub)
        .with(&graph, "Animal", "name", "Nala")
        .with(&graph, "Animal", "food", "meat")
        .with(&graph, "Cat", "lives", "9")
        .with(&graph, "Cub", "age", "1");
    let (written, restored) = roundtrip(&graph, &original);
    assert_eq!(written.len(), 4);
    assert_eq!(restored.state, original.state);
}

#[test]
fn test_empty_graph_generates_no_operations() {
    let graph = graph("struct Plain { value: Integer }");
    assert_eq!(graph.serializable_classes().count(), 0);
    let code = CodeGenerator::new(&graph).generate();
    assert!(!code.contains("ser$$"));
    assert!(!code.contains("deser$$"));
}

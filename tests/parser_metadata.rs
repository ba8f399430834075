//! Declaration metadata: names, inheritance clauses, import tables, and
//! function payloads reported by the structural parser.

use graft::graft::parsing::{parse, NodeKind, ParseOptions, Tree, TypeDecl};

fn parse_default(source: &str) -> Tree {
    parse(source, &ParseOptions::default())
}

fn classes(tree: &Tree) -> Vec<TypeDecl> {
    tree.preorder()
        .into_iter()
        .filter_map(|id| match &tree.get(id).kind {
            NodeKind::Class(decl) => Some(decl.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_five_classes_report_exact_inheritance_clauses() {
    let tree = parse_default(
        "<?php\n\
         class Plain {}\n\
         class Child extends Base {}\n\
         class Single implements One {}\n\
         class Multi implements One, Two, Three {}\n\
         class Both extends \\Vendor\\Base implements One, \\Vendor\\Two {}\n",
    );
    let found = classes(&tree);
    assert_eq!(found.len(), 5);

    assert_eq!(found[0].name, "Plain");
    assert_eq!(found[0].extends, "");
    assert!(found[0].implements.is_empty());

    assert_eq!(found[1].name, "Child");
    assert_eq!(found[1].extends, "Base");
    assert!(found[1].implements.is_empty());

    assert_eq!(found[2].name, "Single");
    assert_eq!(found[2].extends, "");
    assert_eq!(found[2].implements, vec!["One"]);

    assert_eq!(found[3].name, "Multi");
    assert_eq!(found[3].extends, "");
    assert_eq!(found[3].implements, vec!["One", "Two", "Three"]);

    assert_eq!(found[4].name, "Both");
    assert_eq!(found[4].extends, "\\Vendor\\Base");
    assert_eq!(found[4].implements, vec!["One", "\\Vendor\\Two"]);
}

#[test]
fn test_import_alias_table() {
    let tree = parse_default("<?php\nuse A;\nuse B as C;\nuse D\\{E, F as G};\n");
    let imports = tree.imports_at(tree.root());
    assert_eq!(imports.types.get("A").map(String::as_str), Some("A"));
    assert_eq!(imports.types.get("C").map(String::as_str), Some("B"));
    assert_eq!(imports.types.get("E").map(String::as_str), Some("D\\E"));
    assert_eq!(imports.types.get("G").map(String::as_str), Some("D\\F"));
    assert_eq!(imports.types.len(), 4);
}

#[test]
fn test_imports_are_scoped_per_namespace() {
    let tree = parse_default(
        "<?php\nnamespace First;\nuse A\\One;\nnamespace Second;\nuse B\\Two as Alias;\n",
    );
    let namespaces: Vec<_> = tree
        .preorder()
        .into_iter()
        .filter(|&id| matches!(tree.get(id).kind, NodeKind::Namespace(_)))
        .collect();
    assert_eq!(namespaces.len(), 2);

    let first = tree.imports_at(namespaces[0]);
    assert_eq!(first.types.get("One").map(String::as_str), Some("A\\One"));
    assert!(first.types.get("Alias").is_none());

    let second = tree.imports_at(namespaces[1]);
    assert_eq!(second.types.get("Alias").map(String::as_str), Some("B\\Two"));
    assert!(second.types.get("One").is_none());
}

#[test]
fn test_namespace_names_and_forms() {
    let tree = parse_default("<?php namespace A\\B\\C; namespace D {}");
    let decls: Vec<_> = tree
        .preorder()
        .into_iter()
        .filter_map(|id| match &tree.get(id).kind {
            NodeKind::Namespace(decl) => Some((decl.name.clone(), decl.braced)),
            _ => None,
        })
        .collect();
    assert_eq!(
        decls,
        vec![("A\\B\\C".to_string(), false), ("D".to_string(), true)]
    );
}

#[test]
fn test_method_flags_against_free_functions_and_closures() {
    let tree = parse_default(
        "<?php\n\
         function free() {}\n\
         class C {\n\
             public function method() {}\n\
             public function maker() { return function () {}; }\n\
         }\n",
    );
    let functions: Vec<_> = tree
        .preorder()
        .into_iter()
        .filter_map(|id| match &tree.get(id).kind {
            NodeKind::Function(decl) => Some((id, decl.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(functions.len(), 4);

    let free = &functions[0].1;
    assert_eq!(free.name, "free");
    assert!(!free.is_method && !free.is_closure);

    let method = &functions[1].1;
    assert_eq!(method.name, "method");
    assert!(method.is_method);

    let maker = &functions[2].1;
    assert_eq!(maker.name, "maker");
    assert!(maker.is_method);

    let (closure_id, closure) = &functions[3];
    assert!(closure.is_closure);
    assert!(!closure.is_method);
    assert_eq!(closure.name, "");
    // The closure's enclosing-function back-reference points at the method.
    assert_eq!(tree.get(*closure_id).function(), Some(functions[2].0));
}

#[test]
fn test_generator_detection_stays_on_the_innermost_function() {
    let tree = parse_default(
        "<?php\n\
         function outer() {\n\
             $inner = function () { yield 1; };\n\
             return $inner;\n\
         }\n",
    );
    let functions: Vec<_> = tree
        .preorder()
        .into_iter()
        .filter_map(|id| match &tree.get(id).kind {
            NodeKind::Function(decl) => Some(decl.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(functions.len(), 2);
    assert!(!functions[0].is_generator, "outer must not be a generator");
    assert!(functions[1].is_generator, "inner closure yields");
}

#[test]
fn test_parameter_list_order_and_defaults() {
    let tree = parse_default(
        "<?php function f(?int $a, \\NS\\Type &$by_ref, string $s = 'v, w', $m = [1, [2, 3]], ...$tail) {}",
    );
    let decl = tree
        .preorder()
        .into_iter()
        .find_map(|id| match &tree.get(id).kind {
            NodeKind::Function(decl) => Some(decl.clone()),
            _ => None,
        })
        .expect("function node");
    let names: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "by_ref", "s", "m", "tail"]);
    assert_eq!(decl.params[0].hint, "?int");
    assert_eq!(decl.params[1].hint, "\\NS\\Type");
    assert!(decl.params[1].by_ref);
    assert!(decl.params[4].variadic);

    let defaults = decl.defaults();
    assert_eq!(defaults.get("s"), Some(&"'v, w'"));
    assert_eq!(defaults.get("m"), Some(&"[1, [2, 3]]"));
    assert_eq!(defaults.get("a"), None);
}

#[test]
fn test_bodiless_method_declarations() {
    let tree = parse_default(
        "<?php interface I { public function a(); public static function b(int $x); }",
    );
    let functions: Vec<_> = tree
        .preorder()
        .into_iter()
        .filter_map(|id| match &tree.get(id).kind {
            NodeKind::Function(decl) => Some(decl.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(functions.len(), 2);
    assert!(functions.iter().all(|decl| decl.is_method));
    assert!(functions[0].visibility.public);
    assert!(functions[1].visibility.is_static);
    assert_eq!(functions[1].params.len(), 1);
}

#[test]
fn test_trait_uses_and_interface_extends() {
    let tree = parse_default(
        "<?php\n\
         interface Wide extends Narrow {}\n\
         class C { use \\Lib\\T1, T2; }\n",
    );
    let interface = tree
        .preorder()
        .into_iter()
        .find_map(|id| match &tree.get(id).kind {
            NodeKind::Interface(decl) => Some(decl.clone()),
            _ => None,
        })
        .expect("interface node");
    assert_eq!(interface.name, "Wide");
    assert_eq!(interface.extends, "Narrow");

    let class = tree
        .preorder()
        .into_iter()
        .find_map(|id| match &tree.get(id).kind {
            NodeKind::Class(decl) => Some(decl.clone()),
            _ => None,
        })
        .expect("class node");
    assert_eq!(class.trait_uses, vec!["Lib\\T1", "T2"]);
}

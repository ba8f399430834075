//! Round-trip fidelity: unparsing a freshly parsed, unmutated tree must
//! reproduce the input byte for byte, for well-formed and malformed sources
//! alike.

use graft::graft::parsing::{parse, ParseOptions};
use proptest::prelude::*;
use rstest::rstest;

fn assert_round_trip(source: &str) {
    let tree = parse(source, &ParseOptions::default());
    assert_eq!(tree.unparse(), source);
    let tracked = parse(
        source,
        &ParseOptions {
            track_lines: true,
            ..ParseOptions::default()
        },
    );
    assert_eq!(tracked.unparse(), source);
    let code = parse(source, &ParseOptions::code());
    assert_eq!(code.unparse(), source);
}

#[rstest]
#[case::empty("")]
#[case::plain_template("<html><body>no code at all</body></html>\n")]
#[case::code_only_fragment("<?php echo \"hello\";\n")]
#[case::template_sandwich("<p><?php echo 1; ?></p>\n<?= $title ?>tail")]
#[case::namespace_statement("<?php\nnamespace App\\Domain;\n\nfinal class Thing {}\n")]
#[case::namespace_braced("<?php namespace A { class X {} } namespace B { class Y {} }")]
#[case::global_namespace_block("<?php namespace { echo 1; }")]
#[case::imports("<?php use A; use B as C; use D\\{E, F as G}; use function str\\len;\n")]
#[case::use_without_semicolon("<?php use MyClass?>")]
#[case::interface_and_trait(
    "<?php interface I extends A, B { public function m(); }\ntrait T { use Inner; }\n"
)]
#[case::methods_and_closures(
    "<?php class C {\n    public function a($x = [1, ',', 3]) { return $x; }\n    private static function b(): ?int { return null; }\n}\n$f = function () use (&$c) { yield $c; };\n"
)]
#[case::arrow_closures_and_named_args("<?php $f = fn($x) => h($x, named: true);\n")]
#[case::anonymous_class("<?php $x = new class extends Base implements I { public $p = 1; };")]
#[case::constructor_promotion(
    "<?php class P { public function __construct(private readonly int $a, public ?string $b = 'x') {} }"
)]
#[case::attributes(
    "<?php\n#[Route('/a', methods: ['GET', 'POST'])] #[Deprecated]\n#[Multi(\n    1,\n    2,\n)]\nclass C {}\n"
)]
#[case::strings_with_braces("<?php $a = \"pre {$obj->prop['k']} post\"; $b = '{ not code }';")]
#[case::heredoc("<?php $x = <<<EOT\nline { one }\n  line two\nEOT;\n$y = 2;")]
#[case::nowdoc("<?php $x = <<<'RAW'\n$not @interpolated {here}\nRAW;\n")]
#[case::comments("<?php // line\n# hash\n/* block\nspanning */ /** doc */ echo 1;")]
#[case::comment_before_close_tag("<?php // trailing comment ?><b>html</b>")]
#[case::alternate_syntax("<?php if ($x): ?>\n<b>yes</b>\n<?php endif; ?>")]
#[case::magic_constants("<?php require __DIR__ . '/bootstrap.php'; $f = __FILE__;")]
#[case::truncated_statement("<?php class Broken extends")]
#[case::unbalanced_open("<?php function f() { if (true) {")]
#[case::unbalanced_close("<?php } } echo 'still fine';")]
#[case::unterminated_string("<?php $x = \"never closed")]
#[case::unterminated_heredoc("<?php $x = <<<EOT\nno terminator")]
#[case::unterminated_block_comment("<?php /* runs off the end")]
#[case::bare_braces("{ plain braces outside php }")]
#[case::static_and_class_constant("<?php $a = Foo::class; $b = static::make(); $c?->class;")]
fn test_round_trip_corpus(#[case] source: &str) {
    assert_round_trip(source);
}

/// Fragments that compose into PHP-shaped documents, including pathological
/// combinations (dangling declarations, stray braces, region flips).
const FRAGMENTS: &[&str] = &[
    "<?php ",
    "?>",
    "<div>template</div>\n",
    "namespace A\\B;\n",
    "namespace {\n",
    "use X\\Y as Z;\n",
    "use function a\\b;\n",
    "class C extends D implements E {\n",
    "interface I {\n",
    "trait T {\n",
    "use T1, T2;\n",
    "public function m(int $a, &$b, ...$rest) {\n",
    "function free($x = [1, 2], $y = 'd') {\n",
    "$f = function () use ($v) {\n",
    "$g = fn($n) => $n + 1;\n",
    "yield $x;\n",
    "return new class { };\n",
    "#[Attr(1, 'two')]\n",
    "// comment\n",
    "/* block */",
    "$s = \"interp {$x} end\";\n",
    "$s = '{ literal }';\n",
    "$h = <<<EOT\nheredoc body\nEOT;\n",
    "{",
    "}",
    ";",
    "echo 1 + 2;\n",
    "if ($a): endif;\n",
    "$v = Foo::class;\n",
];

proptest! {
    #[test]
    fn prop_arbitrary_input_round_trips(source in any::<String>()) {
        let tree = parse(&source, &ParseOptions::default());
        prop_assert_eq!(tree.unparse(), source);
    }

    #[test]
    fn prop_php_shaped_input_round_trips(
        pieces in proptest::collection::vec(proptest::sample::select(FRAGMENTS), 0..24)
    ) {
        let source: String = pieces.concat();
        let tree = parse(&source, &ParseOptions::default());
        prop_assert_eq!(tree.unparse(), source.clone());
        let code = parse(&source, &ParseOptions::code());
        prop_assert_eq!(code.unparse(), source);
    }
}

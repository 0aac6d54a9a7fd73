use std::fs;
use std::rc::Rc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use paslet::interpreter::Interpreter;
use paslet::natives::NativeRegistry;
use paslet::runner::{self, LogOptions};
use paslet::semantics::SemanticAnalyzer;
use paslet::{lexer, parser};

const WORKLOADS: [(&str, &str); 2] = [
    ("mix", "tests/programs/bench_mix.pas"),
    ("calls", "tests/programs/bench_calls.pas"),
];

fn load_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

fn bench_pipeline(c: &mut Criterion) {
    for (label, path) in WORKLOADS {
        let source = load_source(path);

        c.bench_function(&format!("pipeline_tokenize_{label}"), |b| {
            b.iter(|| {
                let out = lexer::tokenize(black_box(&source)).expect("tokenize");
                black_box(out);
            })
        });

        c.bench_function(&format!("pipeline_parse_{label}"), |b| {
            b.iter(|| {
                let out =
                    parser::parse(black_box(&source), LogOptions::default()).expect("parse");
                black_box(out);
            })
        });

        c.bench_function(&format!("pipeline_analyze_{label}"), |b| {
            let program = parser::parse(&source, LogOptions::default()).expect("parse");
            let natives = Rc::new(NativeRegistry::standard());
            b.iter(|| {
                SemanticAnalyzer::new(Rc::clone(&natives), LogOptions::default())
                    .analyze(black_box(&program))
                    .expect("analyze");
            })
        });

        c.bench_function(&format!("pipeline_interpret_{label}"), |b| {
            let natives = Rc::new(NativeRegistry::standard());
            let program = parser::parse(&source, LogOptions::default()).expect("parse");
            SemanticAnalyzer::new(Rc::clone(&natives), LogOptions::default())
                .analyze(&program)
                .expect("analyze");
            b.iter(|| {
                let out = Interpreter::new(Rc::clone(&natives), LogOptions::default())
                    .interpret(black_box(&program))
                    .expect("interpret");
                black_box(out);
            })
        });

        c.bench_function(&format!("pipeline_full_{label}"), |b| {
            b.iter(|| {
                let out = runner::run(black_box(&source), LogOptions::default());
                black_box(out);
            })
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);

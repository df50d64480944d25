//! Shows how a failing run is minimised, step by step.

use retrace_core::*;

fn main() {
    println!("=== Shrinking a single value ===");
    single_value();

    println!("\n=== Shrinking a derived value ===");
    derived_value();
}

fn single_value() {
    let result = property(|runner: &mut Runner| {
        let n = runner.generate("n", Gen::<u32>::any());
        n < 1000
    })
    .named("below a thousand")
    .run(&Config::default().with_seed(42));

    // The minimal counterexample is the boundary itself.
    println!("{result}");
}

#[derive(Debug, Clone)]
struct Rect {
    width: u16,
    height: u16,
}

fn derived_value() {
    let rect = Gen::derive(|runner| Rect {
        width: runner.generate("width", Gen::<u16>::any()),
        height: runner.generate("height", Gen::<u16>::any()),
    });

    let mut trace = Trace::new();
    let mut rng = SplitMix::new(Seed::from_u64(7));
    let first = Runner::record(&mut rng, &mut trace).generate("rect", rect.clone());
    println!("recorded {first:?}");

    let body = |runner: &mut Runner| {
        let r = runner.generate("rect", rect.clone());
        u32::from(r.width) * u32::from(r.height) < 500
    };
    if !replay(&trace, &body).is_failure() {
        println!("the recorded rectangle is small; nothing to shrink");
        return;
    }

    let report = shrink(trace, &body, &Config::default(), &Printer::pretty());
    println!(
        "{} substitutions accepted over {} attempts",
        report.shrinks, report.attempts
    );
    for (name, value) in &report.minimized {
        println!("{name} = {value}");
    }
}

//! Risk calculation benchmark: exposure windows → per-day aggregation (low-power device target).

use chrono::{Days, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use exposure_risk::config::RiskCalculationConfig;
use exposure_risk::exposure::{
    CalibrationConfidence, ExposureWindow, Infectiousness, ReportType, ScanInstance,
};
use exposure_risk::risk::RiskEngine;

fn make_windows(n: usize) -> Vec<ExposureWindow> {
    let today = Utc::now().date_naive();
    (0..n)
        .map(|i| ExposureWindow {
            date: today - Days::new((i % 14) as u64),
            report_type: if i % 3 == 0 {
                ReportType::SelfReport
            } else {
                ReportType::ConfirmedTest
            },
            infectiousness: if i % 2 == 0 {
                Infectiousness::High
            } else {
                Infectiousness::Standard
            },
            calibration_confidence: CalibrationConfidence::Medium,
            scan_instances: (0..10)
                .map(|j| ScanInstance {
                    minimum_attenuation: 30 + j,
                    typical_attenuation: 40 + (j * 3),
                    seconds_since_last_scan: 180,
                })
                .collect(),
        })
        .collect()
}

fn bench_calculate(c: &mut Criterion) {
    let engine = RiskEngine::new(RiskCalculationConfig::default());
    let windows = make_windows(100);

    c.bench_function("risk_calculate_100_windows", |b| {
        b.iter(|| black_box(engine.calculate(black_box(&windows), Utc::now())))
    });
}

fn bench_calculate_by_count(c: &mut Criterion) {
    let engine = RiskEngine::new(RiskCalculationConfig::default());
    let mut g = c.benchmark_group("risk_calculate_by_count");
    for n in [10, 100, 1000] {
        let windows = make_windows(n);
        g.bench_function(format!("windows_{}", n).as_str(), |b| {
            b.iter(|| black_box(engine.calculate(black_box(&windows), Utc::now())))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_calculate, bench_calculate_by_count);
criterion_main!(benches);

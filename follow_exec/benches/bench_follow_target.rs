//! # Follow Target Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use comms_if::{
    msg::{FollowTargetStatus, TargetEstimate},
    topic::{topic, Publication}
};
use follow_lib::{
    follow_target::{ActivateData, FollowTarget, InputData, Params, Perspective, Setpoint},
    sim_target::{DroneParams, SimTarget, TargetParams, Trajectory},
};
use util::module::FlightTask;

fn follow_target_benchmark(c: &mut Criterion) {
    // ---- Build the task and a circling target ----

    let sim_target = SimTarget::new(TargetParams {
        trajectory: Trajectory::Circle {
            radius_m: 30.0,
            speed_ms: 3.0,
        },
        ..Default::default()
    })
    .unwrap();

    let drone = DroneParams {
        start_position_m: [0.0, 0.0, -8.0],
        ..Default::default()
    }
    .initial_state();

    let (mut estimate_pub, estimate_sub) = topic::<TargetEstimate>();

    // Statuses are discarded through a topic rather than piling up in a Vec
    let (status_pub, _status_sub) = topic::<FollowTargetStatus>();

    let mut follow = FollowTarget::new(
        Params {
            perspective: Perspective::FrontRight,
            ..Default::default()
        },
        estimate_sub,
        status_pub,
    )
    .unwrap();

    follow
        .activate(ActivateData {
            last_setpoint: Setpoint::default(),
            drone,
        })
        .unwrap();

    let mut time_s = 0.0;

    // Bench a single cycle, with a new estimate each time
    c.bench_function("FollowTarget::update", |b| {
        b.iter(|| {
            time_s += 0.05;
            estimate_pub.publish(sim_target.estimate_at(time_s));
            follow
                .update(&InputData {
                    drone,
                    dt_s: 0.05,
                    time_us: 1,
                })
                .unwrap()
        })
    });
}

criterion_group!(benches, follow_target_benchmark);
criterion_main!(benches);

use std::{error::Error, process::ExitCode};

use clap::{Parser, ValueEnum};
use mlfq_model::{
    Job, JobKind, Report, Scheduler, Sim,
    core::Ticks,
    scheduler::{FifoScheduler, MlfqConfig, MlfqScheduler, RoundRobinScheduler, mlfq, rr},
};
use rand::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    Mlfq,
    Rr,
    Fifo,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Workload {
    /// Two long CPU-bound jobs mixed with three I/O-bound ones
    Reference,
    /// Bernoulli arrivals drawn from a seeded RNG
    Random,
}

#[derive(Debug, Parser)]
#[command(version, about = "Virtual-time model of a multi-level feedback queue scheduler")]
struct Args {
    #[arg(short, long, value_enum, default_value_t = Policy::Mlfq)]
    scheduler: Policy,

    #[arg(short, long, value_enum, default_value_t = Workload::Reference)]
    workload: Workload,

    /// Seed for the random workload
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Arrival window of the random workload
    #[arg(long, default_value_t = 200)]
    ticks: Ticks,

    #[arg(long, default_value_t = mlfq::NUM_QUEUES)]
    queues: usize,

    #[arg(long, default_value_t = mlfq::BASE_QUANTUM)]
    base_quantum: Ticks,

    #[arg(long, default_value_t = mlfq::BOOST_INTERVAL)]
    boost_interval: Ticks,

    #[arg(long, default_value_t = mlfq::IO_DURATION)]
    io_duration: Ticks,

    #[arg(long, default_value_t = rr::RR_QUANTUM)]
    rr_quantum: Ticks,

    /// Only print the results table
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let jobs = match args.workload {
        Workload::Reference => reference_jobs(),
        Workload::Random => bernoulli_jobs(args.ticks, 0.1, 0.5, args.seed),
    };

    match args.scheduler {
        Policy::Mlfq => {
            let config = MlfqConfig {
                num_queues: args.queues,
                base_quantum: args.base_quantum,
                boost_interval: args.boost_interval,
                io_duration: args.io_duration,
                ..MlfqConfig::default()
            };
            simulate(jobs, MlfqScheduler::new(config)?, args.quiet)
        }
        Policy::Rr => simulate(jobs, RoundRobinScheduler::new(args.rr_quantum)?, args.quiet),
        Policy::Fifo => simulate(jobs, FifoScheduler::new(), args.quiet),
    }
}

fn simulate<S: Scheduler>(jobs: Vec<Job>, scheduler: S, quiet: bool) -> Result<(), Box<dyn Error>> {
    let mut sim = Sim::new(jobs, scheduler)?;
    println!("Scheduler: {}\n", sim.scheduler().name());

    while !sim.all_jobs_completed() {
        let stepped = match sim.step() {
            Ok(stepped) => stepped,
            Err(err) => {
                print_report(&sim.report());
                return Err(err.into());
            }
        };

        if !quiet {
            for (t, event) in &stepped {
                println!("t={t} {event}");
            }
        }
    }

    print_report(&sim.report());
    Ok(())
}

fn print_report(report: &Report) {
    let rule = "+------+-----------+---------+--------+----------+------------+------------+---------+";
    println!("\n{rule}");
    println!("| Proc | Type      | Arrival | Burst  | Response | Completion | Turnaround | Waiting |");
    println!("{rule}");
    for t in &report.tasks {
        println!(
            "| P{:<3} | {:<9} | {:<7} | {:<6} | {:<8} | {:<10} | {:<10} | {:<7} |",
            t.pid,
            t.kind.label(),
            t.arrival_time,
            t.burst_time,
            t.response_time,
            t.completion_time,
            t.turnaround_time,
            t.waiting_time
        );
    }
    println!("{rule}");

    let summary = &report.summary;
    for (label, class) in [
        ("Overall", &summary.overall),
        ("I/O-bound", &summary.io_bound),
        ("CPU-bound", &summary.cpu_bound),
    ] {
        if let Some(avg) = class {
            println!(
                "{label} averages ({} jobs): turnaround {:.2}, waiting {:.2}, response {:.2}",
                avg.count, avg.turnaround, avg.waiting, avg.response
            );
        }
    }
    println!(
        "Makespan: {} ticks, idle: {} ticks, dispatches: {}, boosts: {}",
        summary.makespan, summary.idle_time, summary.dispatches, summary.boosts
    );
}

fn reference_jobs() -> Vec<Job> {
    vec![
        Job::cpu(1, 0, 100),
        Job::io(2, 0, 5),
        Job::io(3, 0, 5),
        Job::cpu(4, 10, 80),
        Job::io(5, 20, 15),
    ]
}

fn bernoulli_jobs(ticks: Ticks, p_arrival: f64, p_io: f64, seed: u64) -> Vec<Job> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut jobs = Vec::new();

    for t in 0..ticks {
        if rng.random::<f64>() < p_arrival {
            let (kind, burst_time) = if rng.random::<f64>() < p_io {
                (JobKind::IoBound, rng.random_range(2..=20))
            } else {
                (JobKind::CpuBound, rng.random_range(20..=120))
            };

            jobs.push(Job {
                id: jobs.len() as u64 + 1,
                arrival_time: t,
                burst_time,
                kind,
            });
        }
    }

    jobs
}

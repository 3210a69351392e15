/*****************************************************************************************[main.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

extern crate clap;
extern crate cpu_time;
extern crate flate2;
extern crate monosmt;
#[macro_use]
extern crate log;
extern crate env_logger;

use clap::{App, Arg, ArgMatches};
use flate2::bufread::GzDecoder;
use monosmt::{gnf, lbool, Config, Context};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process::exit;
use std::str::FromStr;
use std::time::Duration;

mod system;

fn main() {
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(1)
    });
    exit(exitcode);
}

fn opt<T: FromStr>(matches: &ArgMatches, name: &str, default: T) -> T {
    matches
        .value_of(name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn main2() -> io::Result<i32> {
    let resource = system::ResourceMeasure::new();

    let matches = App::new("monosmt")
        .version("0.1.0")
        .about("SAT modulo monotonic theories")
        .arg(Arg::with_name("input-file").help("GNF or DIMACS file, possibly gzipped"))
        .arg(
            Arg::with_name("verbosity")
                .long("verb")
                .default_value("1")
                .takes_value(true),
        )
        .arg(Arg::with_name("model").long("model").help("print the model of the file variables"))
        .arg(
            Arg::with_name("cpu-lim")
                .long("cpu-lim")
                .help("Limit on CPU time, in seconds")
                .takes_value(true),
        )
        .arg(Arg::with_name("time-lim").long("time-lim")
             .help("Limit on wall-clock time per solve call, in seconds")
             .takes_value(true))
        .arg(Arg::with_name("mem-lim").long("mem-lim")
             .help("Limit on memory, in MiB")
             .takes_value(true))
        .arg(Arg::with_name("conflict-lim").long("conflict-lim")
             .help("Limit on conflicts per solve call")
             .takes_value(true))
        .arg(Arg::with_name("propagation-lim").long("propagation-lim")
             .help("Limit on propagations per solve call")
             .takes_value(true))
        .arg(Arg::with_name("var-decay").long("var-decay")
             .help("The variable activity decay factor")
             .default_value("0.95")
             .takes_value(true))
        .arg(Arg::with_name("clause-decay").long("cla-decay")
             .help("The clause activity decay factor")
             .default_value("0.999")
             .takes_value(true))
        .arg(Arg::with_name("random-var-freq").long("rnd-freq")
             .help("Frequency of random decision variables")
             .default_value("0.0")
             .takes_value(true))
        .arg(Arg::with_name("random-seed").long("rnd-seed")
             .help("Seed of the random number generator")
             .default_value("91648253.0")
             .takes_value(true))
        .arg(Arg::with_name("ccmin-mode").long("ccmin-mode")
             .help("Controls conflict clause minimization (0=none, 1=basic, 2=deep)")
             .default_value("2")
             .takes_value(true))
        .arg(Arg::with_name("phase-saving").long("phase-saving")
             .help("Controls the level of phase saving (0=none, 1=limited, 2=full)")
             .default_value("2")
             .takes_value(true))
        .arg(Arg::with_name("rnd-init").long("rnd-init")
             .conflicts_with("no-rnd-init")
             .help("Randomize the initial activity"))
        .arg(Arg::with_name("no-rnd-init").long("no-rnd-init")
             .help("Do not randomize the initial activity [default]"))
        .arg(Arg::with_name("luby-restart").long("luby")
             .conflicts_with("no-luby-restart")
             .help("Use the Luby restart sequence [default]"))
        .arg(Arg::with_name("no-luby-restart").long("no-luby")
             .help("Do not use the Luby restart sequence"))
        .arg(Arg::with_name("restart-first").long("rfirst")
             .help("The base restart interval")
             .default_value("100")
             .takes_value(true))
        .arg(Arg::with_name("restart-inc").long("rinc")
             .help("Restart interval increase factor")
             .default_value("2.0")
             .takes_value(true))
        .arg(Arg::with_name("garbage-frac").long("gc-frac")
             .help("The fraction of wasted memory allowed before a garbage collection is triggered")
             .default_value("0.20")
             .takes_value(true))
        .arg(Arg::with_name("min-learnts-lim").long("min-learnts")
             .help("Minimum learnt clause limit")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("no-theory-prop").long("no-theory-prop")
             .help("Theories only report conflicts, never propagate"))
        .get_matches();

    let mut config = Config::default();
    {
        let s = &mut config.solver;
        s.var_decay = opt(&matches, "var-decay", s.var_decay);
        s.clause_decay = opt(&matches, "clause-decay", s.clause_decay);
        s.random_var_freq = opt(&matches, "random-var-freq", s.random_var_freq);
        s.random_seed = opt(&matches, "random-seed", s.random_seed);
        s.ccmin_mode = opt(&matches, "ccmin-mode", s.ccmin_mode);
        s.phase_saving = opt(&matches, "phase-saving", s.phase_saving);
        s.rnd_init_act = matches.is_present("rnd-init");
        s.luby_restart = !matches.is_present("no-luby-restart");
        s.restart_first = opt(&matches, "restart-first", s.restart_first);
        s.restart_inc = opt(&matches, "restart-inc", s.restart_inc);
        s.garbage_frac = opt(&matches, "garbage-frac", s.garbage_frac);
        s.min_learnts_lim = opt(&matches, "min-learnts-lim", s.min_learnts_lim);
    }
    config.theory.theory_propagation = !matches.is_present("no-theory-prop");
    config.limits.time = matches
        .value_of("time-lim")
        .and_then(|s| s.parse().ok())
        .filter(|&x: &f64| x > 0.)
        .map(Duration::from_secs_f64);
    config.limits.memory_mb = matches.value_of("mem-lim").and_then(|s| s.parse().ok());
    config.limits.conflicts = matches.value_of("conflict-lim").and_then(|s| s.parse().ok());
    config.limits.propagations = matches
        .value_of("propagation-lim")
        .and_then(|s| s.parse().ok());

    if !config.solver.check() {
        eprintln!("Invalid option value");
        exit(1);
    }

    let verbosity = opt(&matches, "verbosity", 0i32);
    if verbosity < 0 || verbosity > 2 {
        eprintln!(
            "ERROR! value <{}> is too small for option \"verb\".",
            verbosity
        );
        exit(1);
    }
    let cpu_lim = matches
        .value_of("cpu-lim")
        .and_then(|s| s.parse().ok())
        .filter(|x: &f64| *x > 0.);

    let mut ctx = Context::with_config(config);

    // setup timeout handler, if any
    if let Some(max_cpu) = cpu_lim {
        let r = system::ResourceMeasure::new();
        ctx.set_stop(move || r.cpu_time() > max_cpu);
    }

    let parse_time = system::ResourceMeasure::new();

    let inst = if let Some(input_file) = matches.value_of("input-file") {
        debug!("solve file {}", input_file);
        let file = BufReader::new(File::open(input_file)?);
        read_input_autogz(file, &mut ctx)?
    } else {
        println!("c Reading from standard input... Use '--help' for help.");
        let stdin = io::stdin();
        read_input_autogz(stdin.lock(), &mut ctx)?
    };

    if verbosity > 0 {
        println!("c |  Number of variables:  {:12}", ctx.n_vars());
        println!("c |  Number of clauses:    {:12}", ctx.n_clauses());
        println!("c |  Number of bitvectors: {:12}", ctx.n_bitvectors());
        println!("c |  Parse time:           {:12.2} s", parse_time.wall_time());
    }

    // without `solve` lines, solve once at the end
    let ret = match inst.results.last() {
        Some(&r) => r,
        None => ctx
            .solve_limited(&[])
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
    };

    if verbosity > 0 {
        ctx.print_stats();
        println!("c CPU time              : {:.3}s", resource.cpu_time());
    }
    if ret == lbool::TRUE {
        println!("s SATISFIABLE");
        if matches.is_present("model") {
            print_model(&ctx, &inst);
        }
    } else if ret == lbool::FALSE {
        println!("s UNSATISFIABLE");
    } else {
        println!("s UNKNOWN");
    }

    let exitcode = if ret == lbool::TRUE {
        10
    } else if ret == lbool::FALSE {
        20
    } else {
        0
    };
    Ok(exitcode)
}

/// Print the model of the file variables as a DIMACS `v` line.
fn print_model(ctx: &Context, inst: &gnf::Instance) {
    let mut line = String::from("v");
    for x in 1..=inst.n_vars() as i64 {
        let v = inst
            .lit(x)
            .and_then(|l| ctx.model_lit(l).ok())
            .unwrap_or(lbool::UNDEF);
        if v == lbool::TRUE {
            line.push_str(&format!(" {}", x));
        } else if v == lbool::FALSE {
            line.push_str(&format!(" {}", -x));
        }
    }
    println!("{} 0", line);
}

fn read_input_autogz<R: BufRead>(mut input: R, ctx: &mut Context) -> io::Result<gnf::Instance> {
    let is_gz = input.fill_buf()?.starts_with(b"\x1F\x8B");
    if is_gz {
        gnf::parse(&mut BufReader::new(GzDecoder::new(input)), ctx)
    } else {
        gnf::parse(&mut input, ctx)
    }
}

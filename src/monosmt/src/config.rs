//! Configuration of a `Context`.

use {
    crate::{
        core::SolverOpts,
        error::{Error, Result},
        limits::ResourceLimits,
    },
    std::{str::FromStr, time::Duration},
};

/// Options of the theory layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TheoryOpts {
    /// Let theories propagate implied atoms. When off, theories only
    /// report conflicts; results are the same, search is slower.
    pub theory_propagation: bool,
}

impl Default for TheoryOpts {
    fn default() -> Self {
        TheoryOpts {
            theory_propagation: true,
        }
    }
}

/// All options of a context.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub solver: SolverOpts,
    pub theory: TheoryOpts,
    pub limits: ResourceLimits,
}

impl Config {
    /// Parse a space separated argument string such as
    /// `"-rnd-seed=3 -no-luby -conflict-limit=1000"`.
    ///
    /// Unknown flags and out-of-range values are rejected with
    /// `Error::InvalidOption`.
    pub fn parse(args: &str) -> Result<Config> {
        let mut c = Config::default();
        for arg in args.split_whitespace() {
            let flag = arg.trim_start_matches('-');
            let (key, val) = match flag.find('=') {
                Some(i) => (&flag[..i], Some(&flag[i + 1..])),
                None => (flag, None),
            };
            match (key, val) {
                ("luby", None) => c.solver.luby_restart = true,
                ("no-luby", None) => c.solver.luby_restart = false,
                ("rnd-init", None) => c.solver.rnd_init_act = true,
                ("no-rnd-init", None) => c.solver.rnd_init_act = false,
                ("theory-prop", None) => c.theory.theory_propagation = true,
                ("no-theory-prop", None) => c.theory.theory_propagation = false,
                ("var-decay", Some(v)) => c.solver.var_decay = num(arg, v)?,
                ("cla-decay", Some(v)) => c.solver.clause_decay = num(arg, v)?,
                ("rnd-freq", Some(v)) => c.solver.random_var_freq = num(arg, v)?,
                ("rnd-seed", Some(v)) => c.solver.random_seed = num(arg, v)?,
                ("ccmin-mode", Some(v)) => c.solver.ccmin_mode = num(arg, v)?,
                ("phase-saving", Some(v)) => c.solver.phase_saving = num(arg, v)?,
                ("rfirst", Some(v)) => c.solver.restart_first = num(arg, v)?,
                ("rinc", Some(v)) => c.solver.restart_inc = num(arg, v)?,
                ("gc-frac", Some(v)) => c.solver.garbage_frac = num(arg, v)?,
                ("min-learnts", Some(v)) => c.solver.min_learnts_lim = num(arg, v)?,
                ("time-limit", Some(v)) => {
                    c.limits.time = Some(Duration::from_secs_f64(num(arg, v)?))
                }
                ("memory-limit", Some(v)) => c.limits.memory_mb = Some(num(arg, v)?),
                ("conflict-limit", Some(v)) => c.limits.conflicts = Some(num(arg, v)?),
                ("propagation-limit", Some(v)) => c.limits.propagations = Some(num(arg, v)?),
                _ => return Err(Error::InvalidOption(arg.to_string())),
            }
        }
        if !c.solver.check() {
            return Err(Error::InvalidOption(args.to_string()));
        }
        Ok(c)
    }
}

fn num<T: FromStr>(arg: &str, v: &str) -> Result<T> {
    v.parse().map_err(|_| Error::InvalidOption(arg.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let c = Config::parse("-no-luby -rnd-seed=7 -ccmin-mode=1 -no-theory-prop").unwrap();
        assert!(!c.solver.luby_restart);
        assert_eq!(c.solver.random_seed, 7.0);
        assert_eq!(c.solver.ccmin_mode, 1);
        assert!(!c.theory.theory_propagation);
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_limits() {
        let c = Config::parse("-time-limit=1.5 -conflict-limit=100 -memory-limit=64").unwrap();
        assert_eq!(c.limits.time, Some(Duration::from_millis(1500)));
        assert_eq!(c.limits.conflicts, Some(100));
        assert_eq!(c.limits.memory_mb, Some(64));
        assert_eq!(c.limits.propagations, None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Config::parse("-bogus").is_err());
        assert!(Config::parse("-rnd-seed=abc").is_err());
        assert!(Config::parse("-var-decay=2.0").is_err());
        assert!(Config::parse("-luby=1").is_err());
    }
}

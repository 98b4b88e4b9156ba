use crate::seeds::Seed;
use std::path::Path;

/// combined stdout/stderr sink inside each replicate directory
pub const RUN_LOG: &str = "run.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Launch,
    Kill,
}

/// build the single shell line issued for one replicate
///
/// launch detaches through nohup so the run survives the session teardown.
/// kill signals by executable name, which also hits unrelated processes
/// sharing that name on the node (accepted limitation of this tool).
pub fn build_command(
    path: &Path,
    executable: &str,
    exec_args: &str,
    seed: &Seed,
    mode: Mode,
) -> String {
    let cd = format!("cd {}", path.display());

    match mode {
        Mode::Kill => format!("{cd}; killall {executable}"),
        Mode::Launch => {
            // the command line keeps the decimal point, only paths sanitize it
            let args = exec_args.replace("%s", &seed.to_string());

            if args.is_empty() {
                format!("{cd}; nohup ./{executable} > {RUN_LOG} 2>&1 &")
            } else {
                format!("{cd}; nohup ./{executable} {args} > {RUN_LOG} 2>&1 &")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_changes_directory_then_signals_by_name() {
        let command = build_command(
            Path::new("/x/robo7/exp_1"),
            "sim",
            "-s %s",
            &Seed::Int(1),
            Mode::Kill,
        );

        assert_eq!(command, "cd /x/robo7/exp_1; killall sim");
    }

    #[test]
    fn launch_substitutes_the_seed_and_detaches() {
        let command = build_command(
            Path::new("/work/robo1/experiment_1"),
            "sim",
            "-s %s",
            &Seed::Int(1),
            Mode::Launch,
        );

        assert_eq!(
            command,
            "cd /work/robo1/experiment_1; nohup ./sim -s 1 > run.log 2>&1 &"
        );
    }

    #[test]
    fn launch_keeps_the_decimal_point_in_arguments() {
        let command = build_command(
            Path::new("/work/robo3/exp_2p5"),
            "sim",
            "--seed %s --trials 10",
            &Seed::Real(2.5),
            Mode::Launch,
        );

        assert_eq!(
            command,
            "cd /work/robo3/exp_2p5; nohup ./sim --seed 2.5 --trials 10 > run.log 2>&1 &"
        );
    }

    #[test]
    fn launch_without_placeholder_keeps_arguments_verbatim() {
        let command = build_command(
            Path::new("/work/robo1/experiment_1"),
            "sim",
            "--fast",
            &Seed::Int(4),
            Mode::Launch,
        );

        assert_eq!(
            command,
            "cd /work/robo1/experiment_1; nohup ./sim --fast > run.log 2>&1 &"
        );
    }

    #[test]
    fn launch_without_arguments_drops_the_argument_slot() {
        let command = build_command(
            Path::new("/work/robo1/experiment_1"),
            "sim",
            "",
            &Seed::Int(4),
            Mode::Launch,
        );

        assert_eq!(
            command,
            "cd /work/robo1/experiment_1; nohup ./sim > run.log 2>&1 &"
        );
    }
}

// ==========================================
// Class Generation Engine - Command line entry
// ==========================================
// class-generation [--db PATH] <command> [args...]
//   readiness <term_id>
//   generate  <term_id> <actor>
//   list      <term_id>
//   show      <proposal_id>
//   refine    <proposal_id>
//   transfer  <proposal_id> <student_id> <from_class_id> <to_class_id> <actor>
//   reassign  <proposal_id> <class_id> <teacher_id> <actor>
//   approve   <proposal_id> <approver>
// Results are printed as JSON.
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use class_generation::app::{get_default_db_path, AppState};
use class_generation::logging;
use class_generation::ClassGenerationApi;
use serde::Serialize;

const USAGE: &str = "usage: class-generation [--db PATH] \
<readiness TERM | generate TERM ACTOR | list TERM | show PROPOSAL | refine PROPOSAL | \
transfer PROPOSAL STUDENT FROM TO ACTOR | reassign PROPOSAL CLASS TEACHER ACTOR | \
approve PROPOSAL APPROVER>";

fn main() -> Result<()> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = match args.iter().position(|a| a == "--db") {
        Some(i) => {
            if i + 1 >= args.len() {
                bail!("--db needs a path\n{}", USAGE);
            }
            let path = args.remove(i + 1);
            args.remove(i);
            path
        }
        None => get_default_db_path(),
    };

    tracing::info!("{} v{}", class_generation::APP_NAME, class_generation::VERSION);
    tracing::info!("database: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    println!("{}", run(&state.class_generation_api, &args)?);
    Ok(())
}

/// Runs one command and returns its result as pretty JSON.
fn run(api: &ClassGenerationApi, args: &[String]) -> Result<String> {
    let arg = |i: usize| -> Result<&str> {
        args.get(i)
            .map(String::as_str)
            .with_context(|| format!("missing argument {}\n{}", i, USAGE))
    };

    match arg(0)? {
        "readiness" => to_json(&api.readiness(arg(1)?)?),
        "generate" => to_json(&api.generate(arg(1)?, None, arg(2)?)?),
        "list" => to_json(&api.list_proposals(arg(1)?)?),
        "show" => to_json(&api.get_proposal(arg(1)?)?),
        "refine" => to_json(&api.refinement_data(arg(1)?)?),
        "transfer" => to_json(&api.transfer_student(
            arg(1)?,
            arg(2)?,
            arg(3)?,
            arg(4)?,
            arg(5)?,
        )?),
        "reassign" => to_json(&api.reassign_teacher(arg(1)?, arg(2)?, arg(3)?, arg(4)?)?),
        "approve" => to_json(&api.approve(arg(1)?, arg(2)?)?),
        other => bail!("unknown command: {}\n{}", other, USAGE),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use class_generation::api::ApiError;
    use tempfile::NamedTempFile;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn state() -> (NamedTempFile, AppState) {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let state = AppState::new(path).unwrap();
        (file, state)
    }

    #[test]
    fn test_refine_and_reassign_commands() {
        let (_file, state) = state();
        let api = &state.class_generation_api;

        let generated: serde_json::Value =
            serde_json::from_str(&run(api, &args(&["generate", "T2026", "admin"])).unwrap()).unwrap();
        let proposal_id = generated["proposal_id"].as_str().unwrap().to_string();

        let refine: serde_json::Value =
            serde_json::from_str(&run(api, &args(&["refine", &proposal_id])).unwrap()).unwrap();
        assert_eq!(refine["proposal_id"], proposal_id.as_str());
        assert_eq!(refine["remaining_moves"], 5);

        let err = run(
            api,
            &args(&["reassign", &proposal_id, "missing-class", "T1", "admin"]),
        )
        .unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert!(matches!(api_err, ApiError::TransferRejected { .. }));
        assert_eq!(api_err.code(), "CLASS_NOT_FOUND");
    }

    #[test]
    fn test_missing_argument_and_unknown_command() {
        let (_file, state) = state();
        let api = &state.class_generation_api;

        let err = run(api, &args(&["reassign", "p1", "c1"])).unwrap_err();
        assert!(err.to_string().contains("missing argument 3"));

        let err = run(api, &args(&["bogus"])).unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }
}

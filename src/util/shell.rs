use std::path::Path;
use std::process::Command;

/// Build a [`Command`] that runs `command_line` through the platform shell in `dir`.
pub fn shell_command(command_line: &str, dir: &Path) -> Command {
    #[cfg(unix)]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    };

    #[cfg(not(unix))]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    };

    cmd.current_dir(dir);
    cmd
}

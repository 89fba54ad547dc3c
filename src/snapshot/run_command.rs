// ABOUTME: Renders a snapshot as an equivalent `docker run` command line.
// ABOUTME: Display only: shown in verbose mode and printed for manual recovery.

use super::{ConfigurationSnapshot, MountKind, RestartPolicy};
use crate::types::ContainerName;
use shell_escape::unix::escape;
use std::borrow::Cow;

fn quote(value: &str) -> String {
    escape(Cow::Borrowed(value)).into_owned()
}

impl ConfigurationSnapshot {
    /// Shell-escaped command that recreates this container by hand.
    ///
    /// Secondary networks are appended as `docker network connect` steps.
    pub fn run_command(&self, name: &ContainerName) -> String {
        let mut args: Vec<String> = vec![
            "docker".into(),
            "run".into(),
            "-d".into(),
            "--name".into(),
            quote(name.as_str()),
        ];

        if self.restart_policy != RestartPolicy::No {
            args.push("--restart".into());
            args.push(quote(&self.restart_policy.to_string()));
        }

        for port in &self.port_bindings {
            let mut spec = String::new();
            match port.host_ip.as_deref() {
                Some(ip) if ip.contains(':') => spec.push_str(&format!("[{}]:", ip)),
                Some(ip) => spec.push_str(&format!("{}:", ip)),
                None => {}
            }
            match port.host_port {
                Some(host_port) => spec.push_str(&format!("{}:", host_port)),
                None if port.host_ip.is_some() => spec.push(':'),
                None => {}
            }
            spec.push_str(&port.port_key());
            args.push("-p".into());
            args.push(quote(&spec));
        }

        for mount in &self.mounts {
            if let (MountKind::Tmpfs, Some(options)) = (mount.kind, &mount.tmpfs_options) {
                args.push("--tmpfs".into());
                args.push(quote(&format!("{}:{}", mount.target, options)));
                continue;
            }
            let spec = match mount.kind {
                MountKind::Tmpfs => format!("type=tmpfs,target={}", mount.target),
                kind => format!("type={},source={},target={}", kind, mount.source, mount.target),
            };
            let spec = if mount.read_only {
                format!("{},readonly", spec)
            } else {
                spec
            };
            args.push("--mount".into());
            args.push(quote(&spec));
        }

        for entry in &self.environment {
            args.push("-e".into());
            args.push(quote(entry));
        }

        if let Some(network) = self.primary_network() {
            args.push("--network".into());
            args.push(quote(network));
        } else if let Some(mode) = self.network_mode.as_deref()
            && !self.attaches_networks()
        {
            args.push("--network".into());
            args.push(quote(mode));
        }

        for (key, value) in &self.labels {
            args.push("--label".into());
            args.push(quote(&format!("{}={}", key, value)));
        }

        if let Some(dir) = &self.working_dir {
            args.push("-w".into());
            args.push(quote(dir));
        }

        if let Some(user) = &self.user {
            args.push("-u".into());
            args.push(quote(user));
        }

        // --entrypoint takes a single word; further words move in front of the command
        let mut trailing: Vec<&str> = Vec::new();
        if let Some(entrypoint) = &self.entrypoint
            && let Some((first, rest)) = entrypoint.split_first()
        {
            args.push("--entrypoint".into());
            args.push(quote(first));
            trailing.extend(rest.iter().map(String::as_str));
        }

        args.push(quote(&self.image.to_string()));

        if let Some(command) = &self.command {
            trailing.extend(command.iter().map(String::as_str));
        }
        args.extend(trailing.into_iter().map(quote));

        let mut line = args.join(" ");
        for network in self.secondary_networks() {
            line.push_str(&format!(
                " && docker network connect {} {}",
                quote(network),
                quote(name.as_str())
            ));
        }
        line
    }
}

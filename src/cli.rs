// SPDX-License-Identifier: MIT

//! CLI definition for dedit.
//
// Only argument structure lives here; the subcommands are carried out in main.rs on top of
// the library's session and store types.
use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    let domain = || {
        Arg::new("domain")
            .help("Domain (e.g. com.example.app / -g / NSGlobalDomain) or a plist path")
            .required(true)
            .index(1)
            .allow_hyphen_values(true)
    };

    let path = |req| {
        Arg::new("path")
            .help("Node path, e.g. persistent-apps[0].tile-data")
            .required(req)
            .index(2)
    };

    Command::new("dedit")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("backend")
                .long("backend")
                .global(true)
                .value_name("BACKEND")
                .value_parser(["auto", "file", "command"])
                .default_value("auto")
                .help("Where preferences are read from and written to"),
        )
        .arg(
            Arg::new("defaults-program")
                .long("defaults-program")
                .global(true)
                .value_name("PATH")
                .help("The defaults executable used by the command backend"),
        )
        .subcommand(
            Command::new("show")
                .about("Print a domain or one node of it")
                .arg(domain())
                .arg(path(false))
                .arg(
                    Arg::new("outline")
                        .short('o')
                        .long("outline")
                        .help("Print an indented key/type/value outline")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("all")
                        .short('a')
                        .long("all")
                        .help("Include keys inherited from the global domain")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("filter")
                        .short('f')
                        .long("filter")
                        .value_name("TEXT")
                        .help("Only keys of the shown dictionary containing TEXT, ignoring case and accents"),
                ),
        )
        .subcommand(
            Command::new("type")
                .about("Show the type of a node")
                .arg(domain())
                .arg(path(true)),
        )
        .subcommand(
            Command::new("set")
                .about("Set the value of a node, creating it under an existing dictionary or at the end of an array")
                .arg(domain())
                .arg(path(true))
                .arg(
                    Arg::new("value")
                        .help("New value, parsed as TYPE")
                        .required(true)
                        .index(3)
                        .allow_hyphen_values(true),
                )
                .arg(
                    Arg::new("type")
                        .short('t')
                        .long("type")
                        .value_name("TYPE")
                        .help("string, bool, int, float, date, data, dict or array (defaults to the current type)"),
                ),
        )
        .subcommand(
            Command::new("rename")
                .about("Rename a dictionary entry")
                .arg(domain())
                .arg(path(true))
                .arg(
                    Arg::new("new_key")
                        .help("New key name")
                        .required(true)
                        .index(3),
                )
                .arg(
                    Arg::new("force")
                        .short('F')
                        .long("force")
                        .help("Overwrite an existing entry with the new name")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("retype")
                .about("Change the type of a node, converting its value")
                .arg(domain())
                .arg(path(true))
                .arg(
                    Arg::new("type")
                        .help("New type")
                        .required(true)
                        .index(3),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete one or more nodes")
                .arg(domain())
                .arg(
                    Arg::new("path")
                        .help("Node paths")
                        .required(true)
                        .index(2)
                        .num_args(1..),
                ),
        )
        .subcommand(Command::new("domains").about("List domains"))
        .subcommand(
            Command::new("recents").about("List recently opened domains").arg(
                Arg::new("clear")
                    .long("clear")
                    .help("Forget all recent domains")
                    .action(ArgAction::SetTrue),
            ),
        )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_the_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["dedit", "show", "NSGlobalDomain", "--backend", "file"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "show");
        assert_eq!(sub.get_one::<String>("domain").unwrap(), "NSGlobalDomain");
        assert_eq!(sub.get_one::<String>("backend").unwrap(), "file");
    }

    #[test]
    fn delete_takes_several_paths() {
        let matches = build_cli()
            .try_get_matches_from(["dedit", "delete", "com.a", "x", "y[1]"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let paths: Vec<&String> = sub.get_many::<String>("path").unwrap().collect();
        assert_eq!(paths, ["x", "y[1]"]);
    }

    #[test]
    fn show_accepts_all_with_a_path_and_filter() {
        let matches = build_cli()
            .try_get_matches_from(["dedit", "show", "com.a", "prefs", "--all", "-f", "dock"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert!(sub.get_flag("all"));
        assert_eq!(sub.get_one::<String>("path").unwrap(), "prefs");
        assert_eq!(sub.get_one::<String>("filter").unwrap(), "dock");
    }
}

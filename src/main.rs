#[macro_use]
extern crate clap;
use clap::{App, AppSettings, Arg, ArgMatches, Shell, SubCommand};

extern crate failure;
use failure::Fail;

extern crate totp_keyring;
use totp_keyring::config::Config;
use totp_keyring::error::*;
use totp_keyring::import::{self, DecodeOptions};
use totp_keyring::prompt::{LinePrompt, Prompt};
use totp_keyring::{secret, totp};

extern crate tracing_subscriber;
use tracing_subscriber::EnvFilter;

use std::io::{self, Write};
use std::path::Path;

const LOG_ENV: &str = "TOTP_LOG";

/// Help text of the name argument that completes to registered names.
const REGISTERED_NAME_HELP: &str = "Name of a registered entry";

const BASH_NAMES: &str = r#"
_totp_with_names() {
    local cur="${COMP_WORDS[COMP_CWORD]}"
    if [[ ${cur} != -* && ${COMP_CWORD} -ge 2 ]]; then
        case "${COMP_WORDS[COMP_CWORD-1]}" in
            get|delete)
                COMPREPLY=( $(compgen -W "$(totp names 2>/dev/null)" -- "${cur}") )
                return 0
                ;;
        esac
    fi
    _totp "$@"
}

complete -F _totp_with_names -o bashdefault -o default totp
"#;

const ZSH_NAMES: &str = r#"
_totp_names() {
    local -a names
    names=(${(f)"$(totp names 2>/dev/null)"})
    compadd -a names
}
"#;

const FISH_NAMES: &str = r#"
complete -c totp -n "__fish_seen_subcommand_from get delete" -f -a "(totp names 2>/dev/null)"
"#;

fn build_cli() -> App<'static, 'static> {
    App::new("totp")
        .version(crate_version!())
        .about("Simple TOTP CLI, powered by the system keyring")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("index")
                .help("Path to the name index [env: TOTP_INDEX] [default: ~/.totp.json]")
                .long("index")
                .takes_value(true)
                .value_name("PATH"),
        )
        .arg(
            Arg::with_name("service")
                .help("Keyring service holding the secrets [env: TOTP_SERVICE] [default: totp]")
                .long("service")
                .takes_value(true)
                .value_name("NAME"),
        )
        .arg(
            Arg::with_name("verbose")
                .help("Log more to stderr (repeat for more)")
                .short("v")
                .long("verbose")
                .multiple(true),
        )
        .subcommand(
            SubCommand::with_name("scan")
                .about("Scan a QR code image and store it to the system keyring")
                .arg(name_arg("Name to register the code as"))
                .arg(
                    Arg::with_name("IMAGE")
                        .help("Path to a PNG, JPEG or GIF image")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::with_name("barcode")
                        .help("The image is a bare code without a margin; may fix images that fail to decode")
                        .short("b")
                        .long("barcode"),
                ),
        )
        .subcommand(
            SubCommand::with_name("add")
                .about("Manually add a secret to the system keyring")
                .arg(name_arg("Name to register the secret as")),
        )
        .subcommand(SubCommand::with_name("list").about("List all registered TOTP codes"))
        .subcommand(
            SubCommand::with_name("get")
                .about("Get a TOTP code from the system keyring")
                .arg(name_arg(REGISTERED_NAME_HELP)),
        )
        .subcommand(
            SubCommand::with_name("delete")
                .about("Delete a TOTP code")
                .arg(name_arg(REGISTERED_NAME_HELP)),
        )
        .subcommand(
            SubCommand::with_name("temp")
                .about("Get a TOTP code from a secret without saving it to the keyring"),
        )
        .subcommand(
            SubCommand::with_name("completion")
                .about("Write a shell completion script to stdout")
                .arg(
                    Arg::with_name("SHELL")
                        .required(true)
                        .possible_values(&Shell::variants())
                        .index(1),
                ),
        )
        .subcommand(
            SubCommand::with_name("names")
                .about("Print registered names for shell completion")
                .setting(AppSettings::Hidden),
        )
}

fn name_arg(help: &'static str) -> Arg<'static, 'static> {
    Arg::with_name("NAME").help(help).required(true).index(1)
}

/// clap's static script, with `get` and `delete` names completed from
/// `totp names` where the shell allows it.
fn completion_script(shell: Shell) -> String {
    let mut script = Vec::new();
    build_cli().gen_completions_to("totp", shell, &mut script);
    let script = String::from_utf8_lossy(&script).into_owned();
    match shell {
        Shell::Bash => script + BASH_NAMES,
        Shell::Fish => script + FISH_NAMES,
        Shell::Zsh => {
            // The helper must exist before the generated function first runs.
            let (head, body) = match script.find('\n') {
                Some(i) => script.split_at(i + 1),
                None => ("", script.as_str()),
            };
            let body: Vec<String> = body
                .lines()
                .map(|line| {
                    if line.contains(REGISTERED_NAME_HELP) {
                        line.replace("_files", "_totp_names")
                    } else {
                        line.to_string()
                    }
                })
                .collect();
            format!("{}{}\n{}\n", head, ZSH_NAMES, body.join("\n"))
        }
        _ => script,
    }
}

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.occurrences_of("verbose"));

    if let Err(ref e) = run(&matches) {
        let stderr = &mut io::stderr();
        let errmsg = "Error writing to stderr";

        writeln!(stderr, "error: {}", e).expect(errmsg);

        let fail: &dyn Fail = e;
        for cause in fail.iter_causes() {
            writeln!(stderr, "caused by: {}", cause).expect(errmsg);
        }

        std::process::exit(1);
    }
}

fn init_logging(verbosity: u64) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn config(matches: &ArgMatches) -> Result<Config> {
    Config::load(matches.value_of("index"), matches.value_of("service"))
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("scan", Some(scan_matches)) => {
            let manager = totp_keyring::open(&config(matches)?);
            let options = DecodeOptions {
                pure_barcode: scan_matches.is_present("barcode"),
            };
            let name = import::import_qr_file(
                &manager,
                required(scan_matches, "NAME"),
                Path::new(required(scan_matches, "IMAGE")),
                options,
                &mut LinePrompt::stdio(),
            )?;
            println!("Given QR code successfully registered as \"{}\".", name);
        }
        ("add", Some(add_matches)) => {
            let manager = totp_keyring::open(&config(matches)?);
            let mut prompt = LinePrompt::stdio();
            let name = manager.resolve_name(required(add_matches, "NAME"), &mut prompt)?;
            let secret = secret::normalize(prompt.secret()?.str())?;
            println!("Current code: {}", totp::current_code(&secret)?);
            manager.add_entry(&name, &secret)?;
            println!("Given secret successfully registered as \"{}\".", name);
        }
        ("list", Some(_)) => {
            let manager = totp_keyring::open(&config(matches)?);
            for name in manager.list_entries()? {
                println!("{}", name);
            }
        }
        ("get", Some(get_matches)) => {
            let manager = totp_keyring::open(&config(matches)?);
            let secret = manager.get_entry(required(get_matches, "NAME"))?;
            println!("{}", totp::current_code(&secret)?);
        }
        ("delete", Some(delete_matches)) => {
            let manager = totp_keyring::open(&config(matches)?);
            let name = required(delete_matches, "NAME");
            manager.delete_entry(name)?;
            println!("Successfully deleted \"{}\".", name);
        }
        ("temp", Some(_)) => {
            let secret = secret::normalize(LinePrompt::stdio().secret()?.str())?;
            println!("{}", totp::current_code(&secret)?);
        }
        ("completion", Some(completion_matches)) => {
            let shell = required(completion_matches, "SHELL")
                .parse::<Shell>()
                .map_err(Error::invalid_format)?;
            print!("{}", completion_script(shell));
        }
        ("names", Some(_)) => {
            // Completion must never fail loudly; an unreadable index yields no candidates.
            let names = config(matches)
                .and_then(|config| totp_keyring::open(&config).list_entries())
                .unwrap_or_default();
            for name in names {
                println!("{}", name);
            }
        }
        _ => unreachable!(),
    }

    Ok(())
}

/// Positional arguments clap has already checked for.
fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches.value_of(name).unwrap_or_default()
}

use clap::{App, Arg, ArgMatches};
use hbs_lms_state::*;
use std::{
    error::Error,
    fmt,
    fs::{read, File, OpenOptions},
    io::{Seek, SeekFrom, Write},
    mem::size_of,
    process::exit,
};

const GENKEY_COMMAND: &str = "genkey";
const INFO_COMMAND: &str = "info";
const RESERVE_COMMAND: &str = "reserve";
const ADVANCE_COMMAND: &str = "advance";

const KEYNAME_PARAMETER: &str = "keyname";
const PARAMETER_PARAMETER: &str = "parameter";
const SEED_PARAMETER: &str = "seed";
const COUNT_PARAMETER: &str = "count";
const MEMORY_PARAMETER: &str = "memory";
const THREADS_PARAMETER: &str = "threads";

const MEMORY_DEFAULT_SIZE: &str = "100000";

#[derive(Debug)]
struct DemoError(String);

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "There is an error: {}", self.0)
    }
}

impl Error for DemoError {}

impl DemoError {
    pub fn raise<R>(message: &str) -> Result<R, Box<dyn Error>> {
        Err(Box::new(Self(String::from(message))))
    }
}

/// Private key in a `.prv` file; updates rewrite the start of the file.
struct KeyFile {
    filename: String,
}

impl PrivateKeyStorage for KeyFile {
    fn read_private_key(&mut self, private_key: &mut [u8]) -> Result<(), ()> {
        let data = read(&self.filename).map_err(|_| ())?;
        if data.len() != private_key.len() {
            return Err(());
        }
        private_key.copy_from_slice(&data);
        Ok(())
    }

    fn update_private_key(&mut self, private_key: &[u8]) -> Result<(), ()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.filename)
            .map_err(|_| ())?;
        file.seek(SeekFrom::Start(0)).map_err(|_| ())?;
        file.write_all(private_key).map_err(|_| ())?;
        file.sync_all().map_err(|_| ())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let keyname = || Arg::new(KEYNAME_PARAMETER).required(true);
    let load_arguments = |command: App<'static>| {
        command
            .arg(keyname())
            .arg(
                Arg::new(MEMORY_PARAMETER)
                    .long(MEMORY_PARAMETER)
                    .takes_value(true)
                    .default_value(MEMORY_DEFAULT_SIZE)
                    .help("Bytes of subtree cache for the working key"),
            )
            .arg(
                Arg::new(THREADS_PARAMETER)
                    .long(THREADS_PARAMETER)
                    .takes_value(true)
                    .default_value("0")
                    .help("Thread count hint, 0 for the default"),
            )
    };

    let command = App::new("HSS State Demo")
        .about("Generates HSS private keys and walks their state")
        .subcommand(
            App::new(GENKEY_COMMAND)
                .arg(keyname())
                .arg(
                    Arg::new(PARAMETER_PARAMETER)
                        .required(false)
                        .help("Specify LMS parameters per level (e.g. 10/4,5/2 (Treeheight 10 and Winternitz parameter 4 on top))")
                        .default_value("5/1"),
                )
                .arg(
                    Arg::new(SEED_PARAMETER)
                        .long(SEED_PARAMETER)
                        .required(false)
                        .takes_value(true)
                        .value_name("seed"),
                ),
        )
        .subcommand(App::new(INFO_COMMAND).arg(keyname()))
        .subcommand(
            load_arguments(App::new(RESERVE_COMMAND))
                .arg(Arg::new(COUNT_PARAMETER).required(true)),
        )
        .subcommand(
            load_arguments(App::new(ADVANCE_COMMAND))
                .arg(Arg::new(COUNT_PARAMETER).required(false).default_value("1")),
        );

    let matches = command.get_matches();

    if let Some(args) = matches.subcommand_matches(GENKEY_COMMAND) {
        genkey(args)?;
        println!("Private key successful generated!");
        return Ok(());
    }

    if let Some(args) = matches.subcommand_matches(INFO_COMMAND) {
        info(args)?;
        return Ok(());
    }

    if let Some(args) = matches.subcommand_matches(RESERVE_COMMAND) {
        reserve(args)?;
        println!("Signatures successful reserved!");
        return Ok(());
    }

    if let Some(args) = matches.subcommand_matches(ADVANCE_COMMAND) {
        advance(args)?;
        return Ok(());
    }

    Ok(())
}

fn get_private_key_name(keyname: &str) -> String {
    keyname.to_string() + ".prv"
}

fn get_aux_name(keyname: &str) -> String {
    keyname.to_string() + ".aux"
}

fn get_parameter(name: &str, args: &ArgMatches) -> String {
    args.value_of(name)
        .expect("Parameter must be present.")
        .into()
}

fn get_number<T: std::str::FromStr>(name: &str, args: &ArgMatches) -> Result<T, Box<dyn Error>> {
    match get_parameter(name, args).parse() {
        Ok(number) => Ok(number),
        Err(_) => DemoError::raise(&format!("{} is not a number", name)),
    }
}

fn genkey(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let keyname = get_parameter(KEYNAME_PARAMETER, args);
    let parameter = parse_genkey_parameter(&get_parameter(PARAMETER_PARAMETER, args));

    let seed: MasterSeed = if let Some(seed) = args.value_of(SEED_PARAMETER) {
        let decoded = hex::decode(seed)?;
        if decoded.len() != size_of::<MasterSeed>() {
            return DemoError::raise("Seed must be 32 bytes");
        }
        let mut seed = MasterSeed::default();
        seed.copy_from_slice(&decoded[..]);
        seed
    } else {
        let mut seed = MasterSeed::default();
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut seed);
        seed
    };

    let private_key_filename = get_private_key_name(&keyname);
    let mut file = File::create(&private_key_filename)?;

    let result = generate_private_key(&parameter, &seed, |data: &[u8]| {
        file.write_all(data).map_err(|_| ())
    });

    if let Err(error) = result {
        return DemoError::raise(&format!("Could not generate private key: {}", error));
    }

    Ok(())
}

fn info(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let keyname = get_parameter(KEYNAME_PARAMETER, args);
    let mut storage = KeyFile {
        filename: get_private_key_name(&keyname),
    };

    let parameter_set = match get_parameter_set(&mut storage) {
        Ok(parameter_set) => parameter_set,
        Err(error) => return DemoError::raise(&format!("Could not read private key: {}", error)),
    };

    for (level, parameter) in parameter_set.parameters.iter().enumerate() {
        println!(
            "Level {}: {:?} / {:?}",
            level,
            parameter.get_lms_parameter(),
            parameter.get_lmots_parameter()
        );
    }
    println!("Next signature: {}", parameter_set.current_count);
    println!("Last signature: {}", parameter_set.max_count);
    println!("Fault hardening: {}", is_fault_hardening_on());

    Ok(())
}

fn load(args: &ArgMatches, info: &mut ExtraInfo) -> Result<WorkingKey<KeyFile>, Box<dyn Error>> {
    let keyname = get_parameter(KEYNAME_PARAMETER, args);
    let memory: usize = get_number(MEMORY_PARAMETER, args)?;
    let threads: usize = get_number(THREADS_PARAMETER, args)?;

    let storage = KeyFile {
        filename: get_private_key_name(&keyname),
    };
    let aux_data = read(get_aux_name(&keyname)).ok();

    init_extra_info(Some(&mut *info));
    extra_info_set_threads(Some(&mut *info), threads);

    match load_working_key(storage, memory, aux_data.as_deref(), Some(info)) {
        Ok(working_key) => Ok(working_key),
        Err(error) => DemoError::raise(&format!("Could not load private key: {}", error)),
    }
}

fn reserve(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let count: u64 = get_number(COUNT_PARAMETER, args)?;

    let mut info = ExtraInfo::new();
    let mut working_key = load(args, &mut info)?;

    if let Err(error) = working_key.reserve_signatures(count, Some(&mut info)) {
        return DemoError::raise(&format!("Could not reserve signatures: {}", error));
    }

    println!("Reserved up to: {}", working_key.reserve_count());

    Ok(())
}

fn advance(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let count: u64 = get_number(COUNT_PARAMETER, args)?;

    let mut info = ExtraInfo::new();
    let mut working_key = load(args, &mut info)?;

    for _ in 0..count {
        match working_key.next_signature_index(Some(&mut info)) {
            Ok(index) => println!("One-time key: {}", index),
            Err(error) => {
                println!("Could not advance private key: {}", error);
                exit(-1);
            }
        }

        if extra_info_test_last_signature(Some(&info)) {
            println!("That was the last signature of this key.");
            break;
        }
    }

    Ok(())
}

fn parse_genkey_parameter(parameter: &str) -> Vec<HssParameter> {
    let mut result = Vec::new();

    for parameter in parameter.split(',') {
        let mut splitted = parameter.split('/');

        let height = splitted
            .next()
            .expect("Merkle tree height not correct specified");
        let winternitz_parameter = splitted
            .next()
            .expect("Winternitz parameter not correct specified");

        let height: u8 = height
            .parse()
            .expect("Merkle tree height not correct specified");
        let winternitz_parameter: u8 = winternitz_parameter
            .parse()
            .expect("Winternitz parameter not correct specified");

        let lm_ots = match winternitz_parameter {
            1 => LmotsAlgorithm::LmotsSha256N32W1,
            2 => LmotsAlgorithm::LmotsSha256N32W2,
            4 => LmotsAlgorithm::LmotsSha256N32W4,
            8 => LmotsAlgorithm::LmotsSha256N32W8,
            _ => panic!("Wrong winternitz parameter"),
        };

        let lms = match height {
            5 => LmsAlgorithm::LmsSha256N32H5,
            10 => LmsAlgorithm::LmsSha256N32H10,
            15 => LmsAlgorithm::LmsSha256N32H15,
            20 => LmsAlgorithm::LmsSha256N32H20,
            25 => LmsAlgorithm::LmsSha256N32H25,
            _ => panic!("Height not supported"),
        };

        result.push(HssParameter::new(lm_ots, lms));
    }

    result
}

#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

//! `minijava`: compiles each given MiniJava file to an LLVM IR file.
//!
//! Files are processed one after another. A failing file is reported and
//! skipped; the exit code is 1 if any file failed.
use asciifile::AsciiFile;
use compiler_lib::{print::layout::write_layout, print_error, OutputSpecification};
use compiler_shared::context::Context;
use failure::{Error, Fail, ResultExt};
use memmap::Mmap;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process::exit,
};
use structopt::StructOpt;
use termcolor::{ColorChoice, StandardStream};

#[derive(StructOpt, Debug)]
#[structopt(name = "minijava")]
struct Opts {
    /// Print the token stream, one token per line
    #[structopt(long = "lextest")]
    lextest: bool,
    /// Stop after parsing
    #[structopt(long = "parsetest")]
    parsetest: bool,
    /// Stop after semantic analysis
    #[structopt(long = "check")]
    check: bool,
    /// Print field and method offsets after semantic analysis
    #[structopt(long = "print-offsets")]
    print_offsets: bool,
    /// Directory the `.ll` files are written to
    #[structopt(
        short = "o",
        long = "out-dir",
        parse(from_os_str),
        default_value = "."
    )]
    out_dir: PathBuf,
    /// Write the generated IR to stdout instead of a file
    #[structopt(long = "stdout")]
    stdout: bool,
    #[structopt(name = "FILE", parse(from_os_str), required = true)]
    files: Vec<PathBuf>,
}

/// What to do with each file. The first flag given in this order wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    LexTest,
    ParseTest,
    Check,
    PrintOffsets,
    Compile,
}

impl Opts {
    fn mode(&self) -> Mode {
        if self.lextest {
            Mode::LexTest
        } else if self.parsetest {
            Mode::ParseTest
        } else if self.check {
            Mode::Check
        } else if self.print_offsets {
            Mode::PrintOffsets
        } else {
            Mode::Compile
        }
    }

    fn output_for(&self, input: &Path) -> Result<OutputSpecification, CliError> {
        if self.stdout {
            return Ok(OutputSpecification::Stdout);
        }
        let stem = input.file_stem().ok_or_else(|| CliError::NoFileStem {
            path: input.to_owned(),
        })?;
        let mut path = self.out_dir.join(stem);
        path.set_extension("ll");
        Ok(OutputSpecification::File(path))
    }
}

#[derive(Debug, Fail)]
enum CliError {
    #[fail(display = "cannot read input file {:?}", path)]
    OpenInput { path: PathBuf },
    #[fail(display = "cannot decode input file {:?}", path)]
    Encoding { path: PathBuf },
    #[fail(display = "cannot compile {:?}", path)]
    Compile { path: PathBuf },
    #[fail(display = "input file {:?} has no name to derive the output from", path)]
    NoFileStem { path: PathBuf },
    #[fail(display = "cannot write output file {:?}", path)]
    WriteOutput { path: PathBuf },
    #[fail(display = "cannot write to stdout")]
    WriteStdout,
}

fn main() {
    env_logger::init();
    let opts = Opts::from_args();

    let mut failed = 0;
    for path in &opts.files {
        log::info!("processing {:?}", path);
        if let Err(err) = run_file(&opts, path) {
            failed += 1;
            let mut stderr = io::stderr();
            if print_error(&mut stderr, &err).is_err() {
                // nothing left to report to
                exit(2);
            }
        }
    }

    if failed > 0 {
        log::info!("{} of {} files failed", failed, opts.files.len());
        exit(1);
    }
}

fn run_file(opts: &Opts, path: &Path) -> Result<(), Error> {
    let mmap: Option<Mmap> = AsciiFile::mmap(path).context(CliError::OpenInput {
        path: path.to_owned(),
    })?;
    let bytes: &[u8] = mmap.as_ref().map_or(&[], |mmap| &mmap[..]);
    let file = AsciiFile::new(bytes).context(CliError::Encoding {
        path: path.to_owned(),
    })?;

    let context = Context::new(&file, Box::new(StandardStream::stderr(ColorChoice::Auto)));
    let result = run_phases(opts, path, &context);
    context.diagnostics.write_statistics();
    result
}

fn run_phases(opts: &Opts, path: &Path, context: &Context<'_>) -> Result<(), Error> {
    let compile_failed = || CliError::Compile {
        path: path.to_owned(),
    };

    match opts.mode() {
        Mode::LexTest => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            compiler_lib::lextest(context, &mut out).context(compile_failed())?;
        }
        Mode::ParseTest => {
            compiler_lib::parse(context).context(compile_failed())?;
        }
        Mode::Check => {
            compiler_lib::analyze(context).context(compile_failed())?;
        }
        Mode::PrintOffsets => {
            let analysis = compiler_lib::analyze(context).context(compile_failed())?;
            let stdout = io::stdout();
            write_layout(&analysis.repo, &mut stdout.lock()).context(CliError::WriteStdout)?;
        }
        Mode::Compile => {
            let output = opts.output_for(path)?;
            let module = compiler_lib::compile(context).context(compile_failed())?;
            match output {
                OutputSpecification::Stdout => {
                    let stdout = io::stdout();
                    let mut out = stdout.lock();
                    module
                        .emit(&mut out)
                        .and_then(|()| out.flush())
                        .context(CliError::WriteStdout)?;
                }
                OutputSpecification::File(out_path) => {
                    let write_failed = || CliError::WriteOutput {
                        path: out_path.clone(),
                    };
                    let mut out = BufWriter::new(File::create(&out_path).context(write_failed())?);
                    module
                        .emit(&mut out)
                        .and_then(|()| out.flush())
                        .context(write_failed())?;
                    log::info!("wrote {:?}", out_path);
                }
            }
        }
    }
    Ok(())
}

use camino::Utf8PathBuf;
use clap::{ArgAction, Args, ValueHint};
use ls8_emulator::runtime::WriteOutput;
use ls8_emulator::{disassemble, Computer, Program};
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct RunOpt {
    /// Program file, one 8 digit binary literal per line
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Print the machine state on stderr before each instruction
    #[arg(short, long, action = ArgAction::SetTrue)]
    trace: bool,

    /// Stop with an error after this many instructions
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// Print the program listing instead of running it
    #[arg(short, long, action = ArgAction::SetTrue)]
    disassemble: bool,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let program = Program::from_path(&self.input)?;
        debug!(size = program.len(), "Loaded program");

        if self.disassemble {
            for line in disassemble(program.bytes()) {
                println!("{line}");
            }
            return Ok(());
        }

        let mut computer = Computer::with_program(program.bytes())?;
        let mut output = WriteOutput::new(std::io::stdout().lock());

        info!("Running program");
        computer.run_with(&mut output, self.max_steps, |computer| {
            if self.trace {
                eprintln!("{}", computer.trace());
            }
        })?;

        info!(cycles = computer.cycles, registers = %computer.registers, "End of program");

        Ok(())
    }
}

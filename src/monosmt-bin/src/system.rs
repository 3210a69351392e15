/*****************************************************************************************[system.rs]
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use cpu_time::ProcessTime;
use std::time::Instant;

/// CPU and wall-clock time spent since creation.
#[derive(Debug)]
pub(crate) struct ResourceMeasure {
    cpu: ProcessTime,
    wall: Instant,
}

impl ResourceMeasure {
    pub(crate) fn new() -> ResourceMeasure {
        ResourceMeasure {
            cpu: ProcessTime::now(),
            wall: Instant::now(),
        }
    }

    /// CPU time of the process, in seconds.
    pub fn cpu_time(&self) -> f64 {
        ProcessTime::now().duration_since(self.cpu).as_secs_f64()
    }

    pub fn wall_time(&self) -> f64 {
        self.wall.elapsed().as_secs_f64()
    }
}

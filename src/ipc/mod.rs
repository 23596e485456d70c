/*!

Communication with the simulator through files in the run directory.

* [wire] decodes requests and encodes responses.
* [gateway] waits for requests and writes responses.
* [pool] keeps a gateway per run.

*/

pub mod wire;
pub mod gateway;
pub mod pool;

pub use self::gateway::SharedMemoryGateway;
pub use self::pool::{GatewayPool,GatewayKey};
pub use self::wire::{Request,Response};
